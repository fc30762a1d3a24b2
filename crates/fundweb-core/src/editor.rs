//! Transaction editor for fund initiatives

use chrono::{DateTime, Utc};

use crate::engine::{self, EditableObject, TransactionEditor};
use crate::error::{ApplyError, ValidationError};
use crate::models::{Initiative, Transaction, TransactionValue};
use crate::query::{BackerQuery, MerchantQuery};
use crate::types::{Capability, Phid, TransactionType, Viewer};

impl EditableObject for Initiative {
    fn phid(&self) -> &Phid {
        &self.phid
    }

    fn view_policy(&self) -> &str {
        &self.view_policy
    }

    fn set_view_policy(&mut self, policy: String) {
        self.view_policy = policy;
    }

    fn edit_policy(&self) -> &str {
        &self.edit_policy
    }

    fn set_edit_policy(&mut self, policy: String) {
        self.edit_policy = policy;
    }

    fn subscriber_phids(&self) -> &[Phid] {
        &self.subscriber_phids
    }

    fn set_subscriber_phids(&mut self, phids: Vec<Phid>) {
        self.subscriber_phids = phids;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.date_modified = now;
    }
}

/// Applies name, description, risks, status, backer and merchant
/// transactions to an [`Initiative`] on behalf of one actor.
pub struct InitiativeEditor<'a> {
    actor: Viewer,
    backers: &'a dyn BackerQuery,
    merchants: &'a dyn MerchantQuery,
    /// Currency assumed for backer amounts written without a code
    default_currency: String,
}

impl<'a> InitiativeEditor<'a> {
    pub fn new(
        actor: Viewer,
        backers: &'a dyn BackerQuery,
        merchants: &'a dyn MerchantQuery,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            actor,
            backers,
            merchants,
            default_currency: default_currency.into(),
        }
    }

    fn require_text(xaction: &Transaction) -> Result<String, ApplyError> {
        xaction
            .new_value()
            .as_text()
            .map(str::to_string)
            .ok_or(ApplyError::InvalidValue {
                transaction_type: xaction.transaction_type(),
                expected: "text",
                actual: xaction.new_value().kind(),
            })
    }

    /// "Invalid" error for a payload of the wrong kind. Merchant payloads are
    /// checked by [`Self::validate_merchant`].
    fn payload_error(xaction: &Transaction) -> Option<ValidationError> {
        let expected = match xaction.transaction_type() {
            TransactionType::Name | TransactionType::Description | TransactionType::Risks => "text",
            TransactionType::Status => "status",
            TransactionType::Backer => "phid",
            _ => return None,
        };
        let actual = xaction.new_value().kind();
        if actual == expected {
            return None;
        }
        Some(ValidationError::new(
            xaction.transaction_type(),
            "Invalid",
            format!("Expected a {} value, got {}.", expected, actual),
            Some(xaction),
        ))
    }

    fn apply_backer(&self, initiative: &mut Initiative, xaction: &Transaction) -> Result<(), ApplyError> {
        let phid = xaction.new_value().as_phid().ok_or(ApplyError::InvalidValue {
            transaction_type: TransactionType::Backer,
            expected: "phid",
            actual: xaction.new_value().kind(),
        })?;

        let backer = self
            .backers
            .load_backer(&self.actor, phid)
            .ok_or_else(|| ApplyError::BackerNotFound { phid: phid.clone() })?;

        let amount = backer
            .amount_as_currency(&self.default_currency)?
            .convert_to(initiative.total.code())?;
        if amount.is_negative() {
            return Err(crate::currency::CurrencyError::Negative {
                amount: amount.to_string(),
            }
            .into());
        }

        initiative.total = initiative.total.add(&amount)?;
        log::debug!(
            "Backer {} added {} to {} (total now {})",
            backer.phid,
            amount,
            initiative.phid,
            initiative.total
        );
        Ok(())
    }

    fn validate_merchant(&self, initiative: &Initiative, xactions: &[Transaction]) -> Vec<ValidationError> {
        let last = xactions.last();

        // Emptiness is judged against the initiative name, matching the
        // behaviour existing initiatives were validated under.
        if engine::resolves_to_empty(&initiative.name, xactions) {
            return vec![ValidationError::new(
                TransactionType::Merchant,
                "Required",
                "Payable merchant is required.",
                last,
            )
            .missing_field()];
        }

        let Some(last) = last else {
            return vec![];
        };

        let authorized = match last.new_value().as_phid() {
            Some(merchant_phid) => !self
                .merchants
                .load_merchants(
                    &self.actor,
                    std::slice::from_ref(merchant_phid),
                    &[Capability::View, Capability::Edit],
                )
                .is_empty(),
            None => false,
        };

        if authorized {
            vec![]
        } else {
            vec![ValidationError::new(
                TransactionType::Merchant,
                "Invalid",
                "You must specify a merchant account you control as the recipient of funds from this initiative.",
                Some(last),
            )]
        }
    }
}

impl TransactionEditor for InitiativeEditor<'_> {
    type Object = Initiative;

    fn actor(&self) -> &Viewer {
        &self.actor
    }

    fn application_class(&self) -> &'static str {
        "PhabricatorFundApplication"
    }

    fn objects_description(&self) -> &'static str {
        "Fund Initiatives"
    }

    fn transaction_types(&self) -> Vec<TransactionType> {
        let mut types = TransactionType::BASE_TYPES.to_vec();
        types.extend([
            TransactionType::Name,
            TransactionType::Description,
            TransactionType::Risks,
            TransactionType::Status,
            TransactionType::Backer,
            TransactionType::Merchant,
            TransactionType::ViewPolicy,
            TransactionType::EditPolicy,
        ]);
        types
    }

    fn custom_old_value(
        &self,
        initiative: &Initiative,
        xaction: &Transaction,
    ) -> Result<TransactionValue, ApplyError> {
        match xaction.transaction_type() {
            TransactionType::Name => Ok(TransactionValue::text(&initiative.name)),
            TransactionType::Description => Ok(TransactionValue::text(&initiative.description)),
            TransactionType::Risks => Ok(TransactionValue::text(&initiative.risks)),
            TransactionType::Status => Ok(TransactionValue::Status(initiative.status)),
            // A backer adds to the total; there is no previous value.
            TransactionType::Backer => Ok(TransactionValue::Null),
            TransactionType::Merchant => Ok(initiative.merchant_phid.clone().into()),
            _ => engine::base_old_value(initiative, xaction),
        }
    }

    fn custom_new_value(
        &self,
        initiative: &Initiative,
        xaction: &Transaction,
    ) -> Result<TransactionValue, ApplyError> {
        match xaction.transaction_type() {
            TransactionType::Name
            | TransactionType::Description
            | TransactionType::Risks
            | TransactionType::Status
            | TransactionType::Backer
            | TransactionType::Merchant => Ok(xaction.new_value().clone()),
            _ => engine::base_new_value(initiative, xaction),
        }
    }

    fn apply_custom_internal(
        &self,
        initiative: &mut Initiative,
        xaction: &Transaction,
    ) -> Result<(), ApplyError> {
        match xaction.transaction_type() {
            TransactionType::Name => {
                initiative.name = Self::require_text(xaction)?;
                Ok(())
            }
            TransactionType::Description => {
                initiative.description = Self::require_text(xaction)?;
                Ok(())
            }
            TransactionType::Risks => {
                initiative.risks = Self::require_text(xaction)?;
                Ok(())
            }
            TransactionType::Merchant => {
                initiative.merchant_phid = match xaction.new_value() {
                    TransactionValue::Phid(phid) if !phid.is_empty() => Some(phid.clone()),
                    TransactionValue::Phid(_) | TransactionValue::Null => None,
                    other => {
                        return Err(ApplyError::InvalidValue {
                            transaction_type: TransactionType::Merchant,
                            expected: "phid",
                            actual: other.kind(),
                        })
                    }
                };
                Ok(())
            }
            TransactionType::Status => {
                initiative.status = xaction.new_value().as_status().ok_or(ApplyError::InvalidValue {
                    transaction_type: TransactionType::Status,
                    expected: "status",
                    actual: xaction.new_value().kind(),
                })?;
                Ok(())
            }
            TransactionType::Backer => self.apply_backer(initiative, xaction),
            TransactionType::Subscribers | TransactionType::Edge => Ok(()),
            _ => engine::base_apply_internal(initiative, xaction),
        }
    }

    fn apply_custom_external(
        &self,
        initiative: &mut Initiative,
        xaction: &Transaction,
    ) -> Result<(), ApplyError> {
        match xaction.transaction_type() {
            TransactionType::Name
            | TransactionType::Description
            | TransactionType::Risks
            | TransactionType::Status
            | TransactionType::Merchant
            | TransactionType::Backer
            | TransactionType::Subscribers
            | TransactionType::Edge => Ok(()),
            _ => engine::base_apply_external(initiative, xaction),
        }
    }

    fn validate_transaction(
        &self,
        initiative: &Initiative,
        transaction_type: TransactionType,
        xactions: &[Transaction],
    ) -> Vec<ValidationError> {
        let mut errors = engine::base_validate(initiative, transaction_type, xactions);
        errors.extend(xactions.iter().filter_map(Self::payload_error));

        match transaction_type {
            TransactionType::Name => {
                if engine::resolves_to_empty(&initiative.name, xactions) {
                    errors.push(
                        ValidationError::new(
                            transaction_type,
                            "Required",
                            "Initiative name is required.",
                            xactions.last(),
                        )
                        .missing_field(),
                    );
                }
            }
            TransactionType::Merchant => {
                errors.extend(self.validate_merchant(initiative, xactions));
            }
            _ => {}
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{Currency, CurrencyError};
    use crate::directory::Directory;
    use crate::engine::apply_transactions;
    use crate::error::EditError;
    use crate::models::{Backer, Merchant};
    use crate::types::InitiativeStatus;

    const ALICE: &str = "PHID-USER-alice";
    const BOB: &str = "PHID-USER-bob";
    const MERCHANT: &str = "PHID-CMRC-roofers";
    const BACKER: &str = "PHID-FBAK-50";

    fn directory() -> Directory {
        let mut directory = Directory::new();
        directory
            .add_merchant(Merchant {
                phid: Phid::from(MERCHANT),
                name: "Roofers Inc".to_string(),
            })
            .add_backer(Backer {
                phid: Phid::from(BACKER),
                initiative_phid: Phid::from("PHID-FITV-roof"),
                backer_phid: Phid::from(BOB),
                amount: "50.00 USD".to_string(),
            })
            .add_backer(Backer {
                phid: Phid::from("PHID-FBAK-euro"),
                initiative_phid: Phid::from("PHID-FITV-roof"),
                backer_phid: Phid::from(BOB),
                amount: "10 EUR".to_string(),
            })
            .grant(None, Phid::from(MERCHANT), &[Capability::View])
            .grant(Some(Phid::from(ALICE)), Phid::from(MERCHANT), &[Capability::Edit])
            .grant(None, Phid::from(BACKER), &[Capability::View])
            .grant(None, Phid::from("PHID-FBAK-euro"), &[Capability::View]);
        directory
    }

    fn initiative(name: &str) -> Initiative {
        let mut initiative = Initiative::initialize_new(&Viewer::new(Phid::from(ALICE)), "USD");
        initiative.name = name.to_string();
        initiative
    }

    fn editor<'a>(actor: &str, directory: &'a Directory) -> InitiativeEditor<'a> {
        InitiativeEditor::new(Viewer::new(Phid::from(actor)), directory, directory, "USD")
    }

    fn xaction(ty: TransactionType, value: TransactionValue) -> Transaction {
        Transaction::new(ty, value)
    }

    fn missing_flags(errors: &[ValidationError]) -> Vec<bool> {
        errors.iter().map(|e| e.is_missing_field_error).collect()
    }

    #[test]
    fn test_registry_lists_every_kind() {
        let directory = directory();
        let types = editor(ALICE, &directory).transaction_types();
        for ty in [
            TransactionType::Name,
            TransactionType::Description,
            TransactionType::Risks,
            TransactionType::Status,
            TransactionType::Backer,
            TransactionType::Merchant,
            TransactionType::ViewPolicy,
            TransactionType::EditPolicy,
            TransactionType::Subscribers,
            TransactionType::Edge,
        ] {
            assert!(types.contains(&ty), "{} missing", ty);
        }
    }

    #[test]
    fn test_old_values() {
        let directory = directory();
        let editor = editor(ALICE, &directory);
        let mut initiative = initiative("Roof Fund");
        initiative.merchant_phid = Some(Phid::from(MERCHANT));

        let old = |ty, value| {
            editor
                .custom_old_value(&initiative, &xaction(ty, value))
                .unwrap()
        };
        assert_eq!(
            old(TransactionType::Name, TransactionValue::text("x")),
            TransactionValue::text("Roof Fund")
        );
        assert_eq!(
            old(TransactionType::Status, TransactionValue::Status(InitiativeStatus::Closed)),
            TransactionValue::Status(InitiativeStatus::Open)
        );
        assert_eq!(
            old(TransactionType::Backer, TransactionValue::phid(BACKER)),
            TransactionValue::Null
        );
        assert_eq!(
            old(TransactionType::Merchant, TransactionValue::Null),
            TransactionValue::phid(MERCHANT)
        );
        assert_eq!(
            old(TransactionType::EditPolicy, TransactionValue::policy("x")),
            TransactionValue::policy(ALICE)
        );
    }

    #[test]
    fn test_new_value_is_passed_through() {
        let directory = directory();
        let editor = editor(ALICE, &directory);
        let value = TransactionValue::phid(BACKER);
        let new = editor
            .custom_new_value(&initiative(""), &xaction(TransactionType::Backer, value.clone()))
            .unwrap();
        assert_eq!(new, value);
    }

    #[test]
    fn test_name_required_when_final_value_empty() {
        let directory = directory();
        let editor = editor(ALICE, &directory);

        let errors = editor.validate_transaction(&initiative(""), TransactionType::Name, &[]);
        assert_eq!(missing_flags(&errors), vec![true]);

        let clearing = [xaction(TransactionType::Name, TransactionValue::text(""))];
        let errors = editor.validate_transaction(&initiative("Roof Fund"), TransactionType::Name, &clearing);
        assert_eq!(missing_flags(&errors), vec![true]);
        assert_eq!(errors[0].transaction_id.as_ref(), Some(clearing[0].id()));

        let setting = [xaction(TransactionType::Name, TransactionValue::text("Roof Fund"))];
        assert!(editor
            .validate_transaction(&initiative(""), TransactionType::Name, &setting)
            .is_empty());
    }

    #[test]
    fn test_merchant_requires_edit_capability() {
        let directory = directory();
        let batch = [xaction(TransactionType::Merchant, TransactionValue::phid(MERCHANT))];

        let errors = editor(BOB, &directory).validate_transaction(
            &initiative("Roof Fund"),
            TransactionType::Merchant,
            &batch,
        );
        assert_eq!(missing_flags(&errors), vec![false]);
        assert_eq!(errors[0].title, "Invalid");

        let errors = editor(ALICE, &directory).validate_transaction(
            &initiative("Roof Fund"),
            TransactionType::Merchant,
            &batch,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unknown_merchant_is_invalid() {
        let directory = directory();
        let batch = [xaction(TransactionType::Merchant, TransactionValue::phid("PHID-CMRC-nope"))];
        let errors = editor(ALICE, &directory).validate_transaction(
            &initiative("Roof Fund"),
            TransactionType::Merchant,
            &batch,
        );
        assert_eq!(missing_flags(&errors), vec![false]);
    }

    #[test]
    fn test_merchant_missing_checks_initiative_name() {
        let directory = directory();
        let editor = editor(ALICE, &directory);

        let errors = editor.validate_transaction(&initiative(""), TransactionType::Merchant, &[]);
        assert_eq!(missing_flags(&errors), vec![true]);
        assert!(editor
            .validate_transaction(&initiative("Roof Fund"), TransactionType::Merchant, &[])
            .is_empty());

        let clearing = [xaction(TransactionType::Merchant, TransactionValue::Null)];
        let errors = editor.validate_transaction(&initiative("Roof Fund"), TransactionType::Merchant, &clearing);
        assert_eq!(missing_flags(&errors), vec![true]);
    }

    #[test]
    fn test_roof_fund_scenario() {
        let directory = directory();
        let editor = editor(ALICE, &directory);
        let mut initiative = initiative("");

        let batch = vec![xaction(TransactionType::Name, TransactionValue::text("Roof Fund"))];
        assert!(engine::validate_transactions(&editor, &initiative, &batch).is_empty());

        apply_transactions(&editor, &mut initiative, batch).unwrap();
        assert_eq!(initiative.name, "Roof Fund");
    }

    #[test]
    fn test_backer_adds_to_total_only() {
        let directory = directory();
        let editor = editor(BOB, &directory);
        let mut initiative = initiative("Roof Fund");
        let before = initiative.clone();

        apply_transactions(
            &editor,
            &mut initiative,
            vec![xaction(TransactionType::Backer, TransactionValue::phid(BACKER))],
        )
        .unwrap();

        assert_eq!(initiative.total, Currency::parse("50", "USD").unwrap());
        let mut expected = before;
        expected.total = initiative.total.clone();
        expected.date_modified = initiative.date_modified;
        assert_eq!(initiative, expected);
    }

    #[test]
    fn test_missing_backer_is_fatal_and_leaves_total() {
        let directory = directory();
        let editor = editor(BOB, &directory);
        let mut initiative = initiative("Roof Fund");

        let err = apply_transactions(
            &editor,
            &mut initiative,
            vec![
                xaction(TransactionType::Backer, TransactionValue::phid(BACKER)),
                xaction(TransactionType::Backer, TransactionValue::phid("PHID-FBAK-gone")),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            EditError::Apply(ApplyError::BackerNotFound {
                phid: Phid::from("PHID-FBAK-gone")
            })
        );
        assert_eq!(initiative.total, Currency::zero("USD"));
    }

    #[test]
    fn test_backer_total_overflow_is_fatal() {
        let mut directory = directory();
        for phid in ["PHID-FBAK-max1", "PHID-FBAK-max2"] {
            directory
                .add_backer(Backer {
                    phid: Phid::from(phid),
                    initiative_phid: Phid::from("PHID-FITV-roof"),
                    backer_phid: Phid::from(BOB),
                    amount: "79228162514264337593543950335 USD".to_string(),
                })
                .grant(None, Phid::from(phid), &[Capability::View]);
        }
        let mut initiative = initiative("Roof Fund");

        let err = apply_transactions(
            &editor(BOB, &directory),
            &mut initiative,
            vec![
                xaction(TransactionType::Backer, TransactionValue::phid("PHID-FBAK-max1")),
                xaction(TransactionType::Backer, TransactionValue::phid("PHID-FBAK-max2")),
            ],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            EditError::Apply(ApplyError::Currency(CurrencyError::Overflow { .. }))
        ));
        assert_eq!(initiative.total, Currency::zero("USD"));
    }

    #[test]
    fn test_backer_in_other_currency_is_fatal() {
        let directory = directory();
        let mut initiative = initiative("Roof Fund");
        let err = editor(BOB, &directory)
            .apply_custom_internal(
                &mut initiative,
                &xaction(TransactionType::Backer, TransactionValue::phid("PHID-FBAK-euro")),
            )
            .unwrap_err();
        assert!(matches!(err, ApplyError::Currency(_)));
        assert_eq!(initiative.total, Currency::zero("USD"));
    }

    #[test]
    fn test_overwrites_are_idempotent() {
        let directory = directory();
        let editor = editor(ALICE, &directory);
        let cases = [
            xaction(TransactionType::Name, TransactionValue::text("Roof Fund")),
            xaction(TransactionType::Description, TransactionValue::text("New roof")),
            xaction(TransactionType::Risks, TransactionValue::text("Rain")),
            xaction(TransactionType::Status, TransactionValue::Status(InitiativeStatus::Closed)),
            xaction(TransactionType::Merchant, TransactionValue::phid(MERCHANT)),
        ];

        for xaction in cases {
            let mut once = initiative("Old");
            editor.apply_custom_internal(&mut once, &xaction).unwrap();
            let mut twice = once.clone();
            editor.apply_custom_internal(&mut twice, &xaction).unwrap();
            assert_eq!(once, twice, "{}", xaction.transaction_type());
        }
    }

    #[test]
    fn test_policy_falls_through_to_base() {
        let directory = directory();
        let mut initiative = initiative("Roof Fund");
        apply_transactions(
            &editor(ALICE, &directory),
            &mut initiative,
            vec![xaction(TransactionType::ViewPolicy, TransactionValue::policy("public"))],
        )
        .unwrap();
        assert_eq!(initiative.view_policy, "public");
    }

    #[test]
    fn test_subscribers_are_a_no_op() {
        let directory = directory();
        let mut initiative = initiative("Roof Fund");
        apply_transactions(
            &editor(ALICE, &directory),
            &mut initiative,
            vec![xaction(
                TransactionType::Subscribers,
                TransactionValue::Phids(vec![Phid::from(BOB)]),
            )],
        )
        .unwrap();
        assert!(initiative.subscriber_phids.is_empty());
    }

    #[test]
    fn test_errors_accumulate_across_types() {
        let directory = directory();
        let mut initiative = initiative("Roof Fund");
        let before = initiative.clone();

        let err = apply_transactions(
            &editor(BOB, &directory),
            &mut initiative,
            vec![
                xaction(TransactionType::Name, TransactionValue::text("")),
                xaction(TransactionType::Merchant, TransactionValue::phid(MERCHANT)),
                xaction(TransactionType::Description, TransactionValue::text("ignored")),
            ],
        )
        .unwrap_err();

        match err {
            EditError::Validation(errors) => {
                assert_eq!(missing_flags(&errors), vec![true, false]);
                assert_eq!(errors[0].transaction_type, TransactionType::Name);
                assert_eq!(errors[1].transaction_type, TransactionType::Merchant);
            }
            other => panic!("expected validation errors, got {:?}", other),
        }
        assert_eq!(initiative, before);
    }

    #[test]
    fn test_wrong_payload_kind_is_invalid() {
        let directory = directory();
        let editor = editor(ALICE, &directory);
        let cases = [
            xaction(TransactionType::Name, TransactionValue::Status(InitiativeStatus::Open)),
            xaction(TransactionType::Description, TransactionValue::phid(MERCHANT)),
            xaction(TransactionType::Risks, TransactionValue::policy("users")),
            xaction(TransactionType::Status, TransactionValue::text("closed")),
            xaction(TransactionType::Backer, TransactionValue::text("50")),
            xaction(TransactionType::Merchant, TransactionValue::Status(InitiativeStatus::Open)),
        ];

        for xaction in cases {
            let ty = xaction.transaction_type();
            let errors = editor.validate_transaction(&initiative("Roof Fund"), ty, std::slice::from_ref(&xaction));
            assert_eq!(missing_flags(&errors), vec![false], "{}", ty);
            assert_eq!(errors[0].title, "Invalid");
            assert_eq!(errors[0].transaction_id.as_ref(), Some(xaction.id()));
        }
    }

    #[test]
    fn test_wrong_payload_kind_never_reaches_apply() {
        let directory = directory();
        let mut initiative = initiative("Roof Fund");
        let before = initiative.clone();
        let err = apply_transactions(
            &editor(ALICE, &directory),
            &mut initiative,
            vec![xaction(TransactionType::Name, TransactionValue::Status(InitiativeStatus::Open))],
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Validation(ref errors) if errors.len() == 1));
        assert_eq!(initiative, before);
    }

    #[test]
    fn test_apply_rejects_wrong_payload_kind() {
        let directory = directory();
        let mut initiative = initiative("Roof Fund");
        let err = editor(ALICE, &directory)
            .apply_custom_internal(
                &mut initiative,
                &xaction(TransactionType::Status, TransactionValue::text("closed")),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ApplyError::InvalidValue {
                transaction_type: TransactionType::Status,
                expected: "status",
                actual: "text",
            }
        );
    }
}
