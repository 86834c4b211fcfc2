//! Red-cell transfusion compatibility.
//!
//! The table is total over the eight [`BloodType`]s, so none of these functions can fail. Text
//! parsing (and its `InvalidBloodType` error) happens at the edges via [`BloodType::parse`].

use hemo_types::BloodType::{self, *};

/// Donor types a recipient may receive, in preference order (exact match first).
pub fn acceptable_donor_types(recipient: BloodType) -> &'static [BloodType] {
    match recipient {
        APos => &[APos, ANeg, OPos, ONeg],
        ANeg => &[ANeg, ONeg],
        BPos => &[BPos, BNeg, OPos, ONeg],
        BNeg => &[BNeg, ONeg],
        AbPos => &[AbPos, AbNeg, APos, ANeg, BPos, BNeg, OPos, ONeg],
        AbNeg => &[AbNeg, ANeg, BNeg, ONeg],
        OPos => &[OPos, ONeg],
        ONeg => &[ONeg],
    }
}

pub fn is_compatible(donor: BloodType, recipient: BloodType) -> bool {
    acceptable_donor_types(recipient).contains(&donor)
}

/// Emergency substitutes for a recipient type, O- first.
///
/// O- is offered unless it was the requested type; O+ is added for Rh-positive recipients unless
/// O+ was requested.
pub fn alternate_types_for(recipient: BloodType) -> Vec<BloodType> {
    let mut alternates = Vec::with_capacity(2);
    if recipient != ONeg {
        alternates.push(ONeg);
    }
    if recipient.is_rh_positive() && recipient != OPos {
        alternates.push(OPos);
    }
    alternates
}

/// Recipient types a donor type can supply, in display order.
pub fn compatible_recipients_for(donor: BloodType) -> Vec<BloodType> {
    BloodType::ALL
        .into_iter()
        .filter(|recipient| is_compatible(donor, *recipient))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_o_negative_is_universal_donor() {
        for recipient in BloodType::ALL {
            assert!(is_compatible(ONeg, recipient), "O- -> {recipient}");
        }
        assert_eq!(compatible_recipients_for(ONeg), BloodType::ALL.to_vec());
    }

    #[test]
    fn test_ab_positive_is_universal_recipient() {
        for donor in BloodType::ALL {
            assert!(is_compatible(donor, AbPos), "{donor} -> AB+");
        }
    }

    #[test]
    fn test_table_rows() {
        assert_eq!(acceptable_donor_types(ANeg), &[ANeg, ONeg]);
        assert_eq!(acceptable_donor_types(AbNeg), &[AbNeg, ANeg, BNeg, ONeg]);
        assert_eq!(acceptable_donor_types(ONeg), &[ONeg]);
        assert!(!is_compatible(APos, ANeg));
        assert!(!is_compatible(BPos, APos));
        assert!(!is_compatible(AbNeg, OPos));
    }

    #[test]
    fn test_every_recipient_accepts_own_type_first() {
        for recipient in BloodType::ALL {
            assert_eq!(acceptable_donor_types(recipient)[0], recipient);
        }
    }

    #[test]
    fn test_alternates_for_b_positive() {
        assert_eq!(alternate_types_for(BPos), vec![ONeg, OPos]);
    }

    #[test]
    fn test_alternates_exclude_requested_type() {
        assert_eq!(alternate_types_for(ONeg), Vec::<BloodType>::new());
        assert_eq!(alternate_types_for(OPos), vec![ONeg]);
        assert_eq!(alternate_types_for(ANeg), vec![ONeg]);
    }

    #[test]
    fn test_compatible_recipients_inverse() {
        assert_eq!(compatible_recipients_for(AbPos), vec![AbPos]);
        assert_eq!(compatible_recipients_for(ANeg), vec![APos, ANeg, AbPos, AbNeg]);
    }
}
