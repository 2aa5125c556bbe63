use proptest::prelude::*;
use stkpay::domain::phone::{PhoneNumber, normalize};

proptest! {
    #[test]
    fn national_numbers_gain_country_code(prefix in "0[17]", rest in "[0-9]{8}") {
        let raw = format!("{prefix}{rest}");
        let phone = PhoneNumber::parse(&raw).unwrap();

        prop_assert_eq!(phone.as_str(), format!("254{}", &raw[1..]));
        prop_assert_eq!(phone.as_str().len(), 12);
    }

    #[test]
    fn international_numbers_are_kept(rest in "[0-9]{9}") {
        let raw = format!("254{rest}");

        let plain = PhoneNumber::parse(&raw).unwrap();
        prop_assert_eq!(plain.as_str(), raw.as_str());
        let plus = PhoneNumber::parse(&format!("+{raw}")).unwrap();
        prop_assert_eq!(plus.as_str(), raw.as_str());
    }

    #[test]
    fn normalize_is_idempotent(raw in "\\+?[0-9 -]{1,14}") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn separators_are_ignored(prefix in "0[17]", a in "[0-9]{2}", b in "[0-9]{3}", c in "[0-9]{3}") {
        let spaced = format!("{prefix}{a} {b}-{c}");
        let plain = format!("{prefix}{a}{b}{c}");

        prop_assert_eq!(
            PhoneNumber::parse(&spaced).unwrap(),
            PhoneNumber::parse(&plain).unwrap()
        );
    }

    #[test]
    fn wrong_lengths_are_rejected(prefix in "0[17]", rest in "[0-9]{0,7}|[0-9]{9,12}") {
        let raw = format!("{prefix}{rest}");
        prop_assert!(PhoneNumber::parse(&raw).is_err());
    }
}
