//! Integration tests for `SqliteStore` against an in-memory database.

use trackplan_core::{
  Conflict, OwnerId, ReconcileError,
  catalog::{EventType, PropertyType},
  store::CatalogStore,
  submission::{EventInput, PlanSubmission, PropertyInput},
};
use uuid::Uuid;

use crate::{Error, SqliteStore, store::classify};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn owner() -> OwnerId { OwnerId::new("user-1").unwrap() }

fn plan(name: &str, events: Vec<EventInput>) -> PlanSubmission {
  PlanSubmission {
    name:        name.into(),
    description: Some(format!("{name} description")),
    events,
  }
}

fn event(
  name: &str,
  event_type: Option<EventType>,
  description: &str,
  properties: Vec<PropertyInput>,
) -> EventInput {
  EventInput {
    name: name.into(),
    description: description.into(),
    event_type,
    additional_properties: false,
    properties,
  }
}

fn prop(name: &str, t: PropertyType, description: &str, required: bool) -> PropertyInput {
  PropertyInput {
    name: name.into(),
    property_type: t,
    description: description.into(),
    required,
  }
}

fn signup_plan() -> PlanSubmission {
  plan("Sample Plan", vec![event(
    "Signup",
    Some(EventType::Track),
    "User signup",
    vec![
      prop("email", PropertyType::String, "User email", true),
      prop("plan", PropertyType::String, "Chosen plan", false),
    ],
  )])
}

fn conflict_of(result: Result<impl std::fmt::Debug, ReconcileError<Error>>) -> Conflict {
  match result {
    Err(ReconcileError::Conflict(c)) => c,
    other => panic!("expected a conflict, got {other:?}"),
  }
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_creates_plan_events_and_properties() {
  let s = store().await;

  let created = s.reconcile(owner(), signup_plan()).await.unwrap();
  assert_eq!(created.name, "Sample Plan");
  assert_eq!(created.description.as_deref(), Some("Sample Plan description"));

  let detail = s.plan_detail(owner(), created.id).await.unwrap().unwrap();
  assert_eq!(detail.events.len(), 1);
  let signup = &detail.events[0];
  assert_eq!(signup.event.name, "Signup");
  assert_eq!(signup.event.event_type, EventType::Track);
  assert!(!signup.additional_properties);
  assert_eq!(signup.properties.len(), 2);
  assert_eq!(signup.properties[0].property.name, "email");
  assert!(signup.properties[0].required);
  assert!(!signup.properties[1].required);
}

#[tokio::test]
async fn event_without_properties_appears_in_detail() {
  let s = store().await;
  let p = s
    .reconcile(owner(), plan("P", vec![event("Logout", None, "User logout", vec![])]))
    .await
    .unwrap();

  let detail = s.plan_detail(owner(), p.id).await.unwrap().unwrap();
  assert_eq!(detail.events.len(), 1);
  assert!(detail.events[0].properties.is_empty());
}

// ─── Plan identity ───────────────────────────────────────────────────────────

#[tokio::test]
async fn resubmitting_plan_reuses_row_and_keeps_description() {
  let s = store().await;

  let first = s.reconcile(owner(), signup_plan()).await.unwrap();

  let mut again = signup_plan();
  again.description = Some("changed".into());
  let second = s.reconcile(owner(), again).await.unwrap();

  assert_eq!(first.id, second.id);
  assert_eq!(second.description.as_deref(), Some("Sample Plan description"));
  assert_eq!(s.list_plans(owner()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn resubmitting_identical_plan_creates_no_duplicate_links() {
  let s = store().await;

  s.reconcile(owner(), signup_plan()).await.unwrap();
  s.reconcile(owner(), signup_plan()).await.unwrap();

  assert_eq!(s.count_rows("events").await.unwrap(), 1);
  assert_eq!(s.count_rows("properties").await.unwrap(), 2);
  assert_eq!(s.count_rows("plan_events").await.unwrap(), 1);
  assert_eq!(s.count_rows("plan_event_properties").await.unwrap(), 2);
}

// ─── Event resolution ────────────────────────────────────────────────────────

#[tokio::test]
async fn untyped_new_event_defaults_to_track() {
  let s = store().await;

  s.reconcile(owner(), plan("P", vec![event("Login", None, "User login", vec![])]))
    .await
    .unwrap();

  let events = s.list_events(owner(), Some("Login".into())).await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].event_type, EventType::Track);
}

#[tokio::test]
async fn untyped_event_reuses_single_existing_type() {
  let s = store().await;

  s.reconcile(
    owner(),
    plan("A", vec![event("Home", Some(EventType::Page), "Home page", vec![])]),
  )
  .await
  .unwrap();
  s.reconcile(owner(), plan("B", vec![event("Home", None, "Home  page", vec![])]))
    .await
    .unwrap();

  let events = s.list_events(owner(), Some("Home".into())).await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].event_type, EventType::Page);
}

#[tokio::test]
async fn same_name_with_explicit_types_coexists() {
  let s = store().await;

  s.reconcile(
    owner(),
    plan("P", vec![
      event("Login", Some(EventType::Track), "User login", vec![]),
      event("Login", Some(EventType::Page), "Login page", vec![]),
    ]),
  )
  .await
  .unwrap();

  let events = s.list_events(owner(), Some("Login".into())).await.unwrap();
  assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn ambiguous_untyped_event_is_rejected_without_writes() {
  let s = store().await;

  s.reconcile(
    owner(),
    plan("Seed", vec![
      event("Login", Some(EventType::Track), "User login", vec![]),
      event("Login", Some(EventType::Page), "User login", vec![]),
    ]),
  )
  .await
  .unwrap();
  let events_before = s.count_rows("events").await.unwrap();

  let result = s
    .reconcile(
      owner(),
      plan("Ambiguous", vec![
        event("Brand New", None, "created before the conflict", vec![]),
        event("Login", None, "User login", vec![]),
      ]),
    )
    .await;

  assert_eq!(conflict_of(result), Conflict::AmbiguousEventType { name: "Login".into() });
  assert_eq!(s.count_rows("events").await.unwrap(), events_before);
  assert_eq!(s.list_plans(owner()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn event_description_conflict_rolls_back_new_plan() {
  let s = store().await;

  s.reconcile(
    owner(),
    plan("A", vec![event("Purchase", Some(EventType::Track), "x", vec![])]),
  )
  .await
  .unwrap();

  let result = s
    .reconcile(
      owner(),
      plan("B", vec![
        event("Refund", Some(EventType::Track), "y", vec![
          prop("amount", PropertyType::Number, "Refund total", true),
        ]),
        event("Purchase", Some(EventType::Track), "y", vec![]),
      ]),
    )
    .await;

  let conflict = conflict_of(result);
  assert_eq!(
    conflict.to_string(),
    "Event \"Purchase\" already exists with a different description."
  );

  let plans = s.list_plans(owner()).await.unwrap();
  assert_eq!(plans.len(), 1);
  assert_eq!(plans[0].name, "A");
  assert!(s.list_events(owner(), Some("Refund".into())).await.unwrap().is_empty());
  assert_eq!(s.count_rows("properties").await.unwrap(), 0);
  assert_eq!(s.count_rows("plan_events").await.unwrap(), 1);
}

// ─── Property resolution ─────────────────────────────────────────────────────

#[tokio::test]
async fn property_description_conflict_is_rejected() {
  let s = store().await;

  s.reconcile(
    owner(),
    plan("Property Plan", vec![event(
      "Purchase",
      Some(EventType::Track),
      "User purchase",
      vec![prop("amount", PropertyType::Number, "Purchase amount", true)],
    )]),
  )
  .await
  .unwrap();

  let result = s
    .reconcile(
      owner(),
      plan("Conflicting Property Plan", vec![event(
        "Refund",
        Some(EventType::Track),
        "User refund",
        vec![prop("amount", PropertyType::Number, "Refund total", true)],
      )]),
    )
    .await;

  let conflict = conflict_of(result);
  assert_eq!(conflict, Conflict::PropertyDescription {
    name:          "amount".into(),
    property_type: PropertyType::Number,
  });
  assert!(s.list_events(owner(), Some("Refund".into())).await.unwrap().is_empty());
}

#[tokio::test]
async fn property_description_whitespace_is_normalised() {
  let s = store().await;

  s.reconcile(
    owner(),
    plan("A", vec![event("Purchase", Some(EventType::Track), "p", vec![
      prop("amount", PropertyType::Number, "Purchase  amount", true),
    ])]),
  )
  .await
  .unwrap();

  s.reconcile(
    owner(),
    plan("B", vec![event("Checkout", Some(EventType::Track), "c", vec![
      prop("amount", PropertyType::Number, "Purchase amount", true),
    ])]),
  )
  .await
  .unwrap();

  assert_eq!(s.list_properties(owner(), None).await.unwrap().len(), 1);
  assert_eq!(s.count_rows("plan_event_properties").await.unwrap(), 2);
}

#[tokio::test]
async fn same_property_name_with_other_type_is_separate() {
  let s = store().await;

  s.reconcile(
    owner(),
    plan("P", vec![event("Purchase", Some(EventType::Track), "p", vec![
      prop("amount", PropertyType::Number, "Amount", true),
      prop("amount", PropertyType::String, "Formatted amount", false),
    ])]),
  )
  .await
  .unwrap();

  let props = s.list_properties(owner(), Some("amount".into())).await.unwrap();
  assert_eq!(props.len(), 2);
}

#[tokio::test]
async fn required_flag_conflict_across_submissions() {
  let s = store().await;

  s.reconcile(
    owner(),
    plan("Required Flag Plan", vec![event(
      "Invite",
      Some(EventType::Track),
      "Invite sent",
      vec![prop("email", PropertyType::String, "Invitee email", true)],
    )]),
  )
  .await
  .unwrap();
  let links_before = s.count_rows("plan_event_properties").await.unwrap();

  let result = s
    .reconcile(
      owner(),
      plan("Required Conflict Plan", vec![event(
        "Invite Accepted",
        Some(EventType::Track),
        "Invite accepted",
        vec![prop("email", PropertyType::String, "Invitee email", false)],
      )]),
    )
    .await;

  let conflict = conflict_of(result);
  assert!(conflict.to_string().contains("conflicting \"required\" values"));
  assert_eq!(s.count_rows("plan_event_properties").await.unwrap(), links_before);
  assert_eq!(s.list_plans(owner()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn required_flag_conflict_within_one_submission() {
  let s = store().await;

  let result = s
    .reconcile(
      owner(),
      plan("P", vec![
        event("Invite", Some(EventType::Track), "i", vec![
          prop("email", PropertyType::String, "Email", true),
        ]),
        event("Signup", Some(EventType::Track), "s", vec![
          prop("email", PropertyType::String, "Email", false),
        ]),
      ]),
    )
    .await;

  assert_eq!(conflict_of(result), Conflict::RequiredFlag { name: "email".into() });
  assert_eq!(s.count_rows("properties").await.unwrap(), 0);
}

#[tokio::test]
async fn additional_properties_conflict_within_plan() {
  let s = store().await;

  s.reconcile(owner(), signup_plan()).await.unwrap();

  let mut changed = signup_plan();
  changed.events[0].additional_properties = true;
  let result = s.reconcile(owner(), changed).await;

  assert!(matches!(conflict_of(result), Conflict::AdditionalProperties { .. }));
}

// ─── Owners ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn owners_do_not_share_catalogs() {
  let s = store().await;
  let other = OwnerId::new("user-2").unwrap();

  let mine = s.reconcile(owner(), signup_plan()).await.unwrap();

  let mut theirs = signup_plan();
  theirs.events[0].description = "Different signup".into();
  theirs.events[0].properties[0].required = false;
  let their_plan = s.reconcile(other.clone(), theirs).await.unwrap();

  assert_ne!(mine.id, their_plan.id);
  assert!(s.get_plan(other.clone(), mine.id).await.unwrap().is_none());
  assert!(s.plan_detail(other.clone(), mine.id).await.unwrap().is_none());
  assert_eq!(s.list_events(other, None).await.unwrap().len(), 1);
}

// ─── Single-entity updates ───────────────────────────────────────────────────

#[tokio::test]
async fn update_descriptions_are_owner_scoped() {
  let s = store().await;
  s.reconcile(owner(), signup_plan()).await.unwrap();

  let event = s.list_events(owner(), None).await.unwrap().remove(0);
  let updated = s
    .update_event_description(owner(), event.id, "Account created".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.description, "Account created");

  let stranger = OwnerId::new("user-2").unwrap();
  assert!(
    s.update_event_description(stranger.clone(), event.id, "hijack".into())
      .await
      .unwrap()
      .is_none()
  );

  let property = s.list_properties(owner(), Some("email".into())).await.unwrap().remove(0);
  let updated = s
    .update_property_description(owner(), property.id, "Primary email".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.description, "Primary email");
  assert!(s.get_property(stranger, property.id).await.unwrap().is_none());
  assert!(s.get_event(owner(), Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Constraint classification ───────────────────────────────────────────────

#[tokio::test]
async fn unique_violation_is_classified_as_concurrent_conflict() {
  let s = store().await;

  let insert = "INSERT INTO tracking_plans (id, name, description, owner_id, created_at)
                VALUES (lower(hex(randomblob(16))), 'Dup', NULL, 'user-1', '2024-01-01T00:00:00+00:00')";
  s.execute_raw(insert).await.unwrap();
  let err = s.execute_raw(insert).await.unwrap_err();
  assert!(err.is_unique_violation(), "{err}");

  let classified = classify(ReconcileError::Store(err));
  assert!(matches!(classified, ReconcileError::Conflict(Conflict::Concurrent(_))));
}

#[tokio::test]
async fn check_violation_stays_a_store_error() {
  let s = store().await;
  let err = s
    .execute_raw(
      "INSERT INTO events (id, name, event_type, description, owner_id, created_at)
       VALUES ('e1', 'Login', 'click', 'd', 'user-1', '2024-01-01T00:00:00.000000Z')",
    )
    .await
    .unwrap_err();
  assert!(!err.is_unique_violation(), "{err}");
  assert!(matches!(classify(ReconcileError::Store(err)), ReconcileError::Store(_)));
}

#[tokio::test]
async fn non_constraint_errors_stay_store_errors() {
  let s = store().await;
  let err = s.execute_raw("SELECT * FROM no_such_table").await.unwrap_err();
  assert!(!err.is_unique_violation());
  assert!(matches!(classify(ReconcileError::Store(err)), ReconcileError::Store(_)));
}

#[tokio::test]
async fn racing_insert_during_reconcile_is_a_concurrent_conflict() {
  let s = store().await;

  // Another writer lands the same property just before our insert.
  s.execute_raw(
    "CREATE TRIGGER racing_writer BEFORE INSERT ON properties
     BEGIN
       INSERT INTO properties (id, name, property_type, description, owner_id, created_at)
       VALUES (NEW.id || '-other', NEW.name, NEW.property_type, 'other writer',
               NEW.owner_id, NEW.created_at);
     END",
  )
  .await
  .unwrap();

  let result = s.reconcile(owner(), signup_plan()).await;

  let conflict = conflict_of(result);
  assert!(matches!(conflict, Conflict::Concurrent(_)));
  let message = conflict.to_string();
  assert!(!message.contains("UNIQUE"), "{message}");
  assert!(!message.contains("properties."), "{message}");

  assert_eq!(s.count_rows("tracking_plans").await.unwrap(), 0);
  assert_eq!(s.count_rows("events").await.unwrap(), 0);
  assert_eq!(s.count_rows("properties").await.unwrap(), 0);
}

#[tokio::test]
async fn aborting_trigger_during_reconcile_is_a_store_error() {
  let s = store().await;
  s.execute_raw(
    "CREATE TRIGGER no_properties BEFORE INSERT ON properties
     BEGIN SELECT RAISE(ABORT, 'properties are frozen'); END",
  )
  .await
  .unwrap();

  let result = s.reconcile(owner(), signup_plan()).await;

  assert!(matches!(result, Err(ReconcileError::Store(_))), "{result:?}");
  assert_eq!(s.count_rows("tracking_plans").await.unwrap(), 0);
}
