//! Diff-and-apply reconciliation of a draft against remote questions

use super::operation::Operation;
use super::payload::{QuestionPayload, build_payload};
use crate::api::ApiError;
use crate::api::client::ApiResult;
use crate::api::models::Question;
use crate::builder::{Draft, ElementId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Backend operations needed to reconcile questions
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn list(&self, survey_id: &str) -> ApiResult<Vec<Question>>;
    async fn create(&self, survey_id: &str, payload: &QuestionPayload) -> ApiResult<Question>;
    async fn update(&self, question_id: &str, payload: &QuestionPayload) -> ApiResult<Question>;
    async fn remove(&self, question_id: &str) -> ApiResult<()>;
}

/// Ordered operations for one reconciliation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub operations: Vec<Operation>,
}

impl SyncPlan {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn count(&self, operation_type: &str) -> usize {
        self.operations
            .iter()
            .filter(|op| op.operation_type() == operation_type)
            .count()
    }

    pub fn creates(&self) -> usize {
        self.count("create")
    }

    pub fn updates(&self) -> usize {
        self.count("update")
    }

    pub fn deletes(&self) -> usize {
        self.count("delete")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Soft failures, such as questions locked by collected responses
    pub warnings: Vec<String>,
    /// Temporary ids replaced by server ids, in creation order
    pub id_remap: Vec<(ElementId, ElementId)>,
}

impl SyncReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Work out the operations that make `remote` match `draft`.
/// Deletes come first, then creates and updates in draft order.
pub fn plan(draft: &Draft, remote: &[Question]) -> SyncPlan {
    let remote_ids: HashSet<&str> = remote.iter().map(|q| q.id.as_str()).collect();
    let mut matched = HashSet::new();
    let mut upserts = Vec::new();

    for (_, _, element) in draft.elements() {
        match element.id.remote_question_id() {
            Some(question_id) if remote_ids.contains(question_id) && matched.insert(question_id) => {
                upserts.push(Operation::update(element.id.clone(), question_id));
            }
            _ => upserts.push(Operation::create(element.id.clone())),
        }
    }

    let mut operations: Vec<Operation> = remote
        .iter()
        .filter(|q| !matched.contains(q.id.as_str()))
        .map(|q| Operation::delete(q.id.clone(), q.title.clone()))
        .collect();
    operations.extend(upserts);

    SyncPlan { operations }
}

/// Payload for an element at its current position
fn payload_for(draft: &Draft, element_id: &ElementId) -> Option<QuestionPayload> {
    let (page_id, order) = draft.locate(element_id)?;
    let element = draft.element(element_id).ok()?;
    Some(build_payload(element, page_id, order))
}

/// Rule source referenced by a payload as sent
fn payload_source(payload: &QuestionPayload) -> Option<ElementId> {
    payload
        .options
        .as_ref()?
        .get("conditionalRequired")?
        .get("sourceId")?
        .as_str()
        .map(ElementId::from)
}

/// Soft-fail on locked questions, abort on anything else
fn absorb(error: ApiError, operation: &Operation, report: &mut SyncReport) -> Result<(), ApiError> {
    if error.is_has_responses() {
        log::warn!("Skipped {}: {}", operation, error);
        report.warnings.push(format!("{}: {}", operation, error));
        Ok(())
    } else {
        log::error!("Sync aborted at {}: {}", operation, error);
        Err(error)
    }
}

/// Reconcile the backend questions with the draft, one operation at a time.
/// Created elements are renamed to `q-<id>` in the draft before the next
/// operation is sent, so later payloads carry the new references.
pub async fn sync_draft<S>(store: &S, draft: &mut Draft) -> Result<SyncReport, ApiError>
where
    S: QuestionStore + ?Sized,
{
    for (old, new) in draft.normalize_ids() {
        log::info!("Repaired duplicate element id {} -> {}", old, new);
    }

    let remote = store.list(&draft.survey_id).await?;
    let plan = plan(draft, &remote);
    log::info!(
        "Syncing survey {}: {} create, {} update, {} delete",
        draft.survey_id,
        plan.creates(),
        plan.updates(),
        plan.deletes()
    );

    let mut report = SyncReport::default();
    // Rule source each element's last sent payload referenced
    let mut sent_sources: HashMap<ElementId, Option<ElementId>> = HashMap::new();

    for operation in &plan.operations {
        log::debug!("Sync step: {}", operation);
        match operation {
            Operation::Delete { question_id, .. } => match store.remove(question_id).await {
                Ok(()) => report.deleted += 1,
                Err(error) => absorb(error, operation, &mut report)?,
            },
            Operation::Create { element } => {
                let Some(payload) = payload_for(draft, element) else {
                    continue;
                };
                match store.create(&draft.survey_id, &payload).await {
                    Ok(question) => {
                        let remote_id = ElementId::remote(&question.id);
                        let sent = payload_source(&payload);
                        draft.remap_id(element, &remote_id);
                        sent_sources.insert(remote_id.clone(), sent);
                        report.id_remap.push((element.clone(), remote_id));
                        report.created += 1;
                    }
                    Err(error) => absorb(error, operation, &mut report)?,
                }
            }
            Operation::Update { element, question_id } => {
                let Some(payload) = payload_for(draft, element) else {
                    continue;
                };
                match store.update(question_id, &payload).await {
                    Ok(_) => {
                        sent_sources.insert(element.clone(), payload_source(&payload));
                        report.updated += 1;
                    }
                    Err(error) => absorb(error, operation, &mut report)?,
                }
            }
        }
    }

    resend_stale_references(store, draft, &sent_sources, &mut report).await?;

    log::info!(
        "Sync finished: {} created, {} updated, {} deleted, {} warnings",
        report.created,
        report.updated,
        report.deleted,
        report.warnings.len()
    );
    Ok(report)
}

/// Elements sent before the element they reference was created still carry
/// its temporary id remotely; send them again with the remapped reference.
async fn resend_stale_references<S>(
    store: &S,
    draft: &Draft,
    sent_sources: &HashMap<ElementId, Option<ElementId>>,
    report: &mut SyncReport,
) -> Result<(), ApiError>
where
    S: QuestionStore + ?Sized,
{
    let stale: Vec<ElementId> = draft
        .elements()
        .map(|(_, _, element)| element)
        .filter(|element| {
            sent_sources.get(&element.id).is_some_and(|sent| {
                let current = element.conditional_required.as_ref().map(|r| &r.source_id);
                sent.as_ref() != current
            })
        })
        .map(|element| element.id.clone())
        .collect();

    for element_id in stale {
        let Some(question_id) = element_id.remote_question_id() else {
            continue;
        };
        let Some(payload) = payload_for(draft, &element_id) else {
            continue;
        };
        let operation = Operation::update(element_id.clone(), question_id);
        log::debug!("Resending {} with remapped rule reference", element_id);
        match store.update(question_id, &payload).await {
            Ok(_) => report.updated += 1,
            Err(error) => absorb(error, &operation, report)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Element, ElementType};

    fn question(id: &str, title: &str) -> Question {
        Question {
            id: id.to_string(),
            question_type: "text".to_string(),
            title: title.to_string(),
            subtitle: None,
            required: false,
            page_number: 1,
            order: 0,
            options: None,
        }
    }

    #[test]
    fn test_plan_deletes_first() {
        let mut draft = Draft::new("s1", "Survey");
        let kept = ElementId::remote("2");
        draft.add_element(1, Element::with_id(kept.clone(), ElementType::Text)).unwrap();
        let fresh = draft.add_element(1, Element::new(ElementType::Date)).unwrap();

        let plan = plan(&draft, &[question("1", "Q1"), question("2", "Q2")]);
        assert_eq!(
            plan.operations,
            vec![
                Operation::delete("1", "Q1"),
                Operation::update(kept, "2"),
                Operation::create(fresh),
            ]
        );
    }

    #[test]
    fn test_prefixed_id_missing_remotely_is_created() {
        let mut draft = Draft::new("s1", "Survey");
        draft
            .add_element(1, Element::with_id(ElementId::remote("77"), ElementType::Text))
            .unwrap();
        let plan = plan(&draft, &[]);
        assert_eq!(plan.creates(), 1);
        assert_eq!(plan.updates(), 0);
    }
}
