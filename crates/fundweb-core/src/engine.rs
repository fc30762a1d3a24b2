//! Generic transaction editor
//!
//! An editor describes how one object type reacts to transactions through
//! the hooks of [`TransactionEditor`]. [`apply_transactions`] drives a batch
//! through those hooks: fill in old/new values, validate every transaction
//! type present, then apply the batch in submission order.
//!
//! The `base_*` functions implement the behaviour shared by every object
//! (policies, subscribers, edges). Editors fall back to them for any kind
//! they do not handle themselves.

use chrono::{DateTime, Utc};

use crate::error::{ApplyError, EditError, ValidationError};
use crate::models::{Transaction, TransactionValue};
use crate::types::{Phid, TransactionType, Viewer};

/// State every editable object exposes to the base editor
pub trait EditableObject: Clone {
    fn phid(&self) -> &Phid;
    fn view_policy(&self) -> &str;
    fn set_view_policy(&mut self, policy: String);
    fn edit_policy(&self) -> &str;
    fn set_edit_policy(&mut self, policy: String);
    fn subscriber_phids(&self) -> &[Phid];
    fn set_subscriber_phids(&mut self, phids: Vec<Phid>);
    /// Record a modification time
    fn touch(&mut self, now: DateTime<Utc>);
}

/// Hooks plugging object-specific semantics into the engine
pub trait TransactionEditor {
    type Object: EditableObject;

    /// The user performing the edit
    fn actor(&self) -> &Viewer;

    fn application_class(&self) -> &'static str;

    fn objects_description(&self) -> &'static str;

    /// Every transaction kind this editor accepts
    fn transaction_types(&self) -> Vec<TransactionType> {
        TransactionType::BASE_TYPES.to_vec()
    }

    fn custom_old_value(
        &self,
        object: &Self::Object,
        xaction: &Transaction,
    ) -> Result<TransactionValue, ApplyError> {
        base_old_value(object, xaction)
    }

    fn custom_new_value(
        &self,
        object: &Self::Object,
        xaction: &Transaction,
    ) -> Result<TransactionValue, ApplyError> {
        base_new_value(object, xaction)
    }

    /// Apply the effect of `xaction` to the object itself
    fn apply_custom_internal(
        &self,
        object: &mut Self::Object,
        xaction: &Transaction,
    ) -> Result<(), ApplyError> {
        base_apply_internal(object, xaction)
    }

    /// Apply effects outside the object, after every internal effect ran
    fn apply_custom_external(
        &self,
        object: &mut Self::Object,
        xaction: &Transaction,
    ) -> Result<(), ApplyError> {
        base_apply_external(object, xaction)
    }

    /// Check all transactions of one type. Must not mutate anything.
    fn validate_transaction(
        &self,
        object: &Self::Object,
        transaction_type: TransactionType,
        xactions: &[Transaction],
    ) -> Vec<ValidationError> {
        base_validate(object, transaction_type, xactions)
    }
}

fn unsupported(xaction: &Transaction) -> ApplyError {
    ApplyError::UnsupportedTransactionType {
        transaction_type: xaction.transaction_type(),
    }
}

fn policy_value(xaction: &Transaction) -> Result<String, ApplyError> {
    xaction
        .new_value()
        .as_policy()
        .map(str::to_string)
        .ok_or(ApplyError::InvalidValue {
            transaction_type: xaction.transaction_type(),
            expected: "policy",
            actual: xaction.new_value().kind(),
        })
}

pub fn base_old_value<O: EditableObject>(
    object: &O,
    xaction: &Transaction,
) -> Result<TransactionValue, ApplyError> {
    match xaction.transaction_type() {
        TransactionType::ViewPolicy => Ok(TransactionValue::policy(object.view_policy())),
        TransactionType::EditPolicy => Ok(TransactionValue::policy(object.edit_policy())),
        TransactionType::Subscribers => Ok(TransactionValue::Phids(object.subscriber_phids().to_vec())),
        TransactionType::Edge => Ok(TransactionValue::Null),
        _ => Err(unsupported(xaction)),
    }
}

pub fn base_new_value<O: EditableObject>(
    _object: &O,
    xaction: &Transaction,
) -> Result<TransactionValue, ApplyError> {
    if xaction.transaction_type().is_core() {
        Ok(xaction.new_value().clone())
    } else {
        Err(unsupported(xaction))
    }
}

pub fn base_apply_internal<O: EditableObject>(
    object: &mut O,
    xaction: &Transaction,
) -> Result<(), ApplyError> {
    match xaction.transaction_type() {
        TransactionType::ViewPolicy => {
            object.set_view_policy(policy_value(xaction)?);
            Ok(())
        }
        TransactionType::EditPolicy => {
            object.set_edit_policy(policy_value(xaction)?);
            Ok(())
        }
        TransactionType::Subscribers => match xaction.new_value() {
            TransactionValue::Phids(phids) => {
                let mut phids = phids.clone();
                phids.sort();
                phids.dedup();
                object.set_subscriber_phids(phids);
                Ok(())
            }
            other => Err(ApplyError::InvalidValue {
                transaction_type: TransactionType::Subscribers,
                expected: "phids",
                actual: other.kind(),
            }),
        },
        // Edges live outside the object.
        TransactionType::Edge => Ok(()),
        _ => Err(unsupported(xaction)),
    }
}

pub fn base_apply_external<O: EditableObject>(
    _object: &mut O,
    xaction: &Transaction,
) -> Result<(), ApplyError> {
    if xaction.transaction_type().is_core() {
        Ok(())
    } else {
        Err(unsupported(xaction))
    }
}

pub fn base_validate<O: EditableObject>(
    _object: &O,
    transaction_type: TransactionType,
    xactions: &[Transaction],
) -> Vec<ValidationError> {
    match transaction_type {
        TransactionType::ViewPolicy | TransactionType::EditPolicy => xactions
            .iter()
            .filter(|x| x.new_value().as_policy().map_or(true, str::is_empty))
            .map(|x| {
                ValidationError::new(
                    transaction_type,
                    "Invalid",
                    "A policy must name a non-empty policy identifier.",
                    Some(x),
                )
            })
            .collect(),
        _ => vec![],
    }
}

/// Whether a text field ends up empty once `xactions` are applied.
///
/// The last transaction decides when there is one; otherwise the current
/// value does.
pub fn resolves_to_empty(current: &str, xactions: &[Transaction]) -> bool {
    match xactions.last() {
        Some(last) => last.new_value().is_blank(),
        None => current.is_empty(),
    }
}

/// Group transactions by type, keeping first-appearance order
fn group_by_type(xactions: &[Transaction]) -> Vec<(TransactionType, Vec<Transaction>)> {
    let mut groups: Vec<(TransactionType, Vec<Transaction>)> = Vec::new();
    for xaction in xactions {
        match groups.iter_mut().find(|(ty, _)| *ty == xaction.transaction_type()) {
            Some((_, group)) => group.push(xaction.clone()),
            None => groups.push((xaction.transaction_type(), vec![xaction.clone()])),
        }
    }
    groups
}

/// Validate every transaction type present in the batch and collect the
/// errors. The object is not touched.
pub fn validate_transactions<E: TransactionEditor>(
    editor: &E,
    object: &E::Object,
    xactions: &[Transaction],
) -> Vec<ValidationError> {
    group_by_type(xactions)
        .into_iter()
        .flat_map(|(ty, group)| editor.validate_transaction(object, ty, &group))
        .collect()
}

/// Validate and apply a batch.
///
/// Returns the recorded transactions (author, object and old/new values
/// filled in). On any error `object` is left exactly as it was: effects are
/// applied to a working copy which replaces `object` only once every
/// transaction succeeded.
pub fn apply_transactions<E: TransactionEditor>(
    editor: &E,
    object: &mut E::Object,
    xactions: Vec<Transaction>,
) -> Result<Vec<Transaction>, EditError> {
    let supported = editor.transaction_types();
    if let Some(bad) = xactions
        .iter()
        .find(|x| !supported.contains(&x.transaction_type()))
    {
        return Err(EditError::Apply(unsupported(bad)));
    }

    let actor = editor.actor().phid.clone();
    let mut recorded = Vec::with_capacity(xactions.len());
    for xaction in xactions {
        let xaction = xaction.with_context(actor.clone(), object.phid().clone());
        let old_value = editor.custom_old_value(object, &xaction)?;
        let new_value = editor.custom_new_value(object, &xaction)?;
        recorded.push(xaction.with_values(old_value, new_value));
    }

    let errors = validate_transactions(editor, object, &recorded);
    if !errors.is_empty() {
        log::warn!(
            "Rejected edit of {} by {}: {} validation error(s)",
            object.phid(),
            actor,
            errors.len()
        );
        return Err(EditError::Validation(errors));
    }

    let mut working = object.clone();
    for xaction in &recorded {
        log::debug!(
            "Applying {} ({}) to {}",
            xaction.transaction_type(),
            xaction.id(),
            working.phid()
        );
        editor.apply_custom_internal(&mut working, xaction)?;
    }
    for xaction in &recorded {
        editor.apply_custom_external(&mut working, xaction)?;
    }
    working.touch(Utc::now());
    *object = working;

    log::info!(
        "Applied {} transaction(s) to {} {}",
        recorded.len(),
        editor.objects_description(),
        object.phid()
    );

    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal object relying entirely on base behaviour
    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        phid: Phid,
        view_policy: String,
        edit_policy: String,
        subscribers: Vec<Phid>,
        modified: Option<DateTime<Utc>>,
    }

    impl EditableObject for Note {
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
            &self.subscribers
        }
        fn set_subscriber_phids(&mut self, phids: Vec<Phid>) {
            self.subscribers = phids;
        }
        fn touch(&mut self, now: DateTime<Utc>) {
            self.modified = Some(now);
        }
    }

    struct NoteEditor {
        actor: Viewer,
    }

    impl TransactionEditor for NoteEditor {
        type Object = Note;

        fn actor(&self) -> &Viewer {
            &self.actor
        }
        fn application_class(&self) -> &'static str {
            "NotesApplication"
        }
        fn objects_description(&self) -> &'static str {
            "Notes"
        }
        fn transaction_types(&self) -> Vec<TransactionType> {
            let mut types = TransactionType::BASE_TYPES.to_vec();
            types.push(TransactionType::ViewPolicy);
            types
        }
    }

    fn note() -> Note {
        Note {
            phid: Phid::from("PHID-NOTE-1"),
            view_policy: "users".to_string(),
            edit_policy: "PHID-USER-alice".to_string(),
            subscribers: vec![],
            modified: None,
        }
    }

    fn editor() -> NoteEditor {
        NoteEditor {
            actor: Viewer::new(Phid::from("PHID-USER-alice")),
        }
    }

    #[test]
    fn test_resolves_to_empty() {
        let set = |v: &str| Transaction::new(TransactionType::Name, TransactionValue::text(v));

        assert!(resolves_to_empty("", &[]));
        assert!(!resolves_to_empty("Roof Fund", &[]));
        assert!(!resolves_to_empty("", &[set("Roof Fund")]));
        assert!(resolves_to_empty("Roof Fund", &[set("")]));
        assert!(!resolves_to_empty("", &[set(""), set("Roof Fund")]));
        assert!(resolves_to_empty("", &[set("Roof Fund"), set("")]));
    }

    #[test]
    fn test_base_policy_apply_records_old_value() {
        let mut note = note();
        let recorded = apply_transactions(
            &editor(),
            &mut note,
            vec![Transaction::new(
                TransactionType::ViewPolicy,
                TransactionValue::policy("public"),
            )],
        )
        .unwrap();

        assert_eq!(note.view_policy, "public");
        assert!(note.modified.is_some());
        assert_eq!(recorded[0].old_value(), Some(&TransactionValue::policy("users")));
        assert_eq!(recorded[0].author_phid(), Some(&Phid::from("PHID-USER-alice")));
        assert_eq!(recorded[0].object_phid(), Some(&note.phid));
    }

    #[test]
    fn test_base_subscribers_deduplicate() {
        let mut note = note();
        let bob = Phid::from("PHID-USER-bob");
        apply_transactions(
            &editor(),
            &mut note,
            vec![Transaction::new(
                TransactionType::Subscribers,
                TransactionValue::Phids(vec![bob.clone(), bob.clone()]),
            )],
        )
        .unwrap();
        assert_eq!(note.subscribers, vec![bob]);
    }

    #[test]
    fn test_empty_policy_is_invalid() {
        let mut note = note();
        let before = note.clone();
        let err = apply_transactions(
            &editor(),
            &mut note,
            vec![Transaction::new(TransactionType::ViewPolicy, TransactionValue::policy(""))],
        )
        .unwrap_err();

        match err {
            EditError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(!errors[0].is_missing_field_error);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(note, before);
    }

    #[test]
    fn test_unregistered_type_is_fatal() {
        let mut note = note();
        let err = apply_transactions(
            &editor(),
            &mut note,
            vec![Transaction::new(TransactionType::EditPolicy, TransactionValue::policy("x"))],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EditError::Apply(ApplyError::UnsupportedTransactionType {
                transaction_type: TransactionType::EditPolicy
            })
        );
    }

    #[test]
    fn test_wrong_payload_kind_aborts_whole_batch() {
        let mut note = note();
        let before = note.clone();
        let err = apply_transactions(
            &editor(),
            &mut note,
            vec![
                Transaction::new(TransactionType::Subscribers, TransactionValue::Phids(vec![])),
                Transaction::new(TransactionType::Subscribers, TransactionValue::text("bob")),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Apply(ApplyError::InvalidValue { .. })));
        assert_eq!(note, before);
    }

    #[test]
    fn test_group_by_type_keeps_order() {
        let xactions = vec![
            Transaction::new(TransactionType::Edge, TransactionValue::Null),
            Transaction::new(TransactionType::ViewPolicy, TransactionValue::policy("a")),
            Transaction::new(TransactionType::Edge, TransactionValue::Null),
        ];
        let groups = group_by_type(&xactions);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, TransactionType::Edge);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, TransactionType::ViewPolicy);
    }
}
