//! End-to-end validation runs through an attached form.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use fieldwise::{
    Concurrency, DispatchConfig, DispatchError, EditContext, FailurePolicy, MessageStore,
    RunOutcome, Services, ValidationDispatcher, ValidatorRegistry, definition,
};
use fieldwise_core::{
    ErrorEntry, FieldIdentifier, Handle, ModelCatalog, ModelType, ModelValidator,
    ValidationContext, ValidatorError, erase,
};
use pretty_assertions::assert_eq;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const FIRST_NAME_EMPTY: &str = "'First Name' must not be empty.";
const GRADE_OUT_OF_RANGE: &str = "'Grade' must be between 1 and 12 (exclusive). You entered 15.";

// ---------------------------------------------------------------------------
// Validators with controlled behaviour
// ---------------------------------------------------------------------------

/// Always fails, counting its calls.
struct Broken(Arc<AtomicUsize>);

#[async_trait]
impl ModelValidator for Broken {
    type Model = Student;

    fn name(&self) -> &str {
        "broken"
    }

    async fn validate(
        &self,
        _ctx: &ValidationContext<Student>,
    ) -> Result<Vec<ErrorEntry>, ValidatorError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(ValidatorError::failed(self.name(), "directory offline"))
    }
}

/// Reports nothing, counting its calls.
struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl ModelValidator for Counting {
    type Model = Student;

    fn name(&self) -> &str {
        "counting"
    }

    async fn validate(
        &self,
        _ctx: &ValidationContext<Student>,
    ) -> Result<Vec<ErrorEntry>, ValidatorError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

/// Never finishes within any reasonable budget.
struct Slow;

#[async_trait]
impl ModelValidator for Slow {
    type Model = Student;

    fn name(&self) -> &str {
        "slow"
    }

    async fn validate(
        &self,
        _ctx: &ValidationContext<Student>,
    ) -> Result<Vec<ErrorEntry>, ValidatorError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// The first call blocks until released; later calls return at once.
struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait]
impl ModelValidator for Gate {
    type Model = Student;

    fn name(&self) -> &str {
        "gate"
    }

    async fn validate(
        &self,
        _ctx: &ValidationContext<Student>,
    ) -> Result<Vec<ErrorEntry>, ValidatorError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered.notify_one();
            self.release.notified().await;
            return Ok(vec![
                ErrorEntry::new("FirstName", "first run"),
                ErrorEntry::new("LastName", "first run"),
            ]);
        }
        Ok(vec![ErrorEntry::new("FirstName", "second run")])
    }
}

struct Gated {
    dispatcher: Arc<ValidationDispatcher>,
    ctx: Arc<EditContext>,
    entered: Arc<Notify>,
    release: Arc<Notify>,
    _student: Handle<Student>,
}

fn gated() -> Gated {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let mut registry = ValidatorRegistry::new();
    registry
        .register(
            ModelType::of::<Student>(),
            erase(Gate {
                entered: Arc::clone(&entered),
                release: Arc::clone(&release),
                calls: AtomicUsize::new(0),
            }),
        )
        .unwrap();

    let student = Handle::new(Student::default());
    let ctx = Arc::new(EditContext::for_handle(&student));
    let dispatcher = ValidationDispatcher::new(
        Arc::new(ModelCatalog::builder().register::<Student>().build().unwrap()),
        Arc::new(registry),
        ctx.create_message_store(),
        DispatchConfig::default(),
    );
    Gated {
        dispatcher: Arc::new(dispatcher),
        ctx,
        entered,
        release,
        _student: student,
    }
}

fn failing_services(
    policy: FailurePolicy,
    concurrency: Concurrency,
) -> (Arc<Services>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let broken = Arc::new(AtomicUsize::new(0));
    let counting = Arc::new(AtomicUsize::new(0));
    let (b, c) = (Arc::clone(&broken), Arc::clone(&counting));
    let services = services_with(
        DispatchConfig {
            failure_policy: policy,
            concurrency,
            ..DispatchConfig::default()
        },
        vec![
            definition("student", |_| Ok(student_rules())),
            definition("broken", move |_| Ok(Broken(Arc::clone(&b)))),
            definition("counting", move |_| Ok(Counting(Arc::clone(&c)))),
        ],
    );
    (services, broken, counting)
}

// ---------------------------------------------------------------------------
// Whole-model runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_student_reports_exactly_two_messages() {
    let services = services();
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);

    assert!(!ctx.validate().await.unwrap());
    assert_eq!(
        ctx.validation_messages(),
        vec![FIRST_NAME_EMPTY, GRADE_OUT_OF_RANGE]
    );
    assert_eq!(
        ctx.messages_for(&ctx.field("FirstName").unwrap()),
        vec![FIRST_NAME_EMPTY]
    );
    assert!(ctx.messages_for(&ctx.field("LastName").unwrap()).is_empty());
}

#[tokio::test]
async fn whole_model_run_touches_without_dirtying() {
    let services = services();
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);
    let mut state = ctx.subscribe_validation_state();

    ctx.validate().await.unwrap();

    for name in ["FirstName", "LastName", "Grade"] {
        assert!(ctx.is_touched(&ctx.field(name).unwrap()), "{name} not touched");
    }
    assert!(!ctx.is_modified());
    assert!(state.has_changed().unwrap());
}

#[tokio::test]
async fn fixing_the_student_makes_it_valid() {
    let services = services();
    let catalog = services.resolve::<ModelCatalog>().unwrap();
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);
    assert!(!ctx.validate().await.unwrap());

    let first_name = ctx.field("FirstName").unwrap();
    ctx.update_field(&catalog, &first_name, "Jane".into())
        .await
        .unwrap();
    assert!(ctx.messages_for(&first_name).is_empty());
    assert_eq!(ctx.validation_messages(), vec![GRADE_OUT_OF_RANGE]);
    assert!(ctx.is_field_modified(&first_name));

    let grade = ctx.field("Grade").unwrap();
    ctx.update_field(&catalog, &grade, 7_i32.into()).await.unwrap();
    assert!(ctx.validation_messages().is_empty());
    assert!(ctx.validate().await.unwrap());
}

#[tokio::test]
async fn field_change_reports_only_that_field() {
    let services = services();
    let catalog = services.resolve::<ModelCatalog>().unwrap();
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);

    let last_name = ctx.field("LastName").unwrap();
    ctx.update_field(&catalog, &last_name, "".into())
        .await
        .unwrap();
    assert_eq!(
        ctx.validation_messages(),
        vec!["'Last Name' must not be empty."]
    );

    ctx.update_field(&catalog, &last_name, "Doe".into())
        .await
        .unwrap();
    assert!(ctx.validation_messages().is_empty());
}

#[tokio::test]
async fn nested_errors_attach_to_the_nested_instance() {
    let services = services();
    let catalog = services.resolve::<ModelCatalog>().unwrap();
    let address1 = Handle::new(Address {
        line1: String::new(),
        city: "York".into(),
        postcode: "YO1 7HH".into(),
    });
    let customer = Handle::new(Customer {
        first_name: "Ann".into(),
        last_name: "Lee".into(),
        address1: address1.clone(),
        address2: Some(valid_address()),
    });
    let (ctx, _form) = attach(&services, &customer);

    assert!(!ctx.validate().await.unwrap());
    let line1 = FieldIdentifier::of(&address1, "Line1");
    assert_eq!(ctx.messages_for(&line1), vec!["'Line1' must not be empty."]);
    assert!(ctx.is_touched(&line1));

    ctx.update_field(&catalog, &line1, "2 Low St".into())
        .await
        .unwrap();
    assert!(ctx.messages_for(&line1).is_empty());
    assert!(ctx.validate().await.unwrap());
}

#[tokio::test]
async fn collection_errors_attach_to_each_element() {
    let services = services();
    let bad = Handle::new(LineItem {
        name: String::new(),
        quantity: 0,
    });
    let order = Handle::new(Order {
        reference: "A-1".into(),
        items: vec![
            Some(Handle::new(LineItem {
                name: "Pen".into(),
                quantity: 2,
            })),
            Some(bad.clone()),
            None,
        ],
        lookup: Vec::new(),
    });
    let (ctx, _form) = attach(&services, &order);

    assert!(!ctx.validate().await.unwrap());
    assert_eq!(
        ctx.messages_for(&FieldIdentifier::of(&bad, "Name")),
        vec!["'Name' must not be empty."]
    );
    assert_eq!(
        ctx.messages_for(&FieldIdentifier::of(&bad, "Quantity")),
        vec!["'Quantity' must be between 1 and 99. You entered 0."]
    );
    assert_eq!(ctx.validation_messages().len(), 2);
}

#[tokio::test]
async fn model_without_validators_is_valid() {
    let services = services();
    let node = Handle::new(Node::default());
    let (ctx, _form) = attach(&services, &node);
    assert!(ctx.validate().await.unwrap());
}

#[tokio::test]
async fn context_without_model_cannot_be_validated() {
    let services = services();
    let ctx = Arc::new(EditContext::empty());
    let mut form = fieldwise::FormValidator::new(Arc::clone(&services));
    form.set_edit_context(Some(Arc::clone(&ctx))).unwrap();

    assert_eq!(ctx.validate().await, Err(DispatchError::MissingModel));
}

// ---------------------------------------------------------------------------
// Cancellation and overlapping runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_run_leaves_messages_untouched() {
    let services = services();
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);
    ctx.validate().await.unwrap();

    {
        let mut s = student.write();
        s.first_name = "Jane".into();
        s.grade = 5;
    }
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(
        ctx.validate_with(&cancel).await,
        Err(DispatchError::Cancelled)
    );
    assert_eq!(ctx.validation_messages().len(), 2);

    assert!(ctx.validate().await.unwrap());
}

#[tokio::test]
async fn older_model_run_is_superseded_by_a_newer_one() {
    let gated = gated();
    let first = {
        let (dispatcher, ctx) = (Arc::clone(&gated.dispatcher), Arc::clone(&gated.ctx));
        tokio::spawn(async move {
            dispatcher
                .validate_model(&ctx, &CancellationToken::new())
                .await
        })
    };
    gated.entered.notified().await;

    let second = gated
        .dispatcher
        .validate_model(&gated.ctx, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second, RunOutcome::Completed { valid: false });

    gated.release.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), RunOutcome::Superseded);

    let store: &Arc<MessageStore> = gated.dispatcher.store();
    assert_eq!(store.all_messages(), vec!["second run"]);
}

#[tokio::test]
async fn model_run_keeps_a_newer_field_commit() {
    let gated = gated();
    let first = {
        let (dispatcher, ctx) = (Arc::clone(&gated.dispatcher), Arc::clone(&gated.ctx));
        tokio::spawn(async move {
            dispatcher
                .validate_model(&ctx, &CancellationToken::new())
                .await
        })
    };
    gated.entered.notified().await;

    let first_name = gated.ctx.field("FirstName").unwrap();
    gated
        .dispatcher
        .validate_field(&gated.ctx, &first_name, &CancellationToken::new())
        .await
        .unwrap();

    gated.release.notify_one();
    assert_eq!(
        first.await.unwrap().unwrap(),
        RunOutcome::Completed { valid: false }
    );
    assert_eq!(gated.ctx.messages_for(&first_name), vec!["second run"]);
    assert_eq!(
        gated.ctx.messages_for(&gated.ctx.field("LastName").unwrap()),
        vec!["first run"]
    );
}

// ---------------------------------------------------------------------------
// Failure policy, scheduling and timeouts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fail_fast_aborts_without_committing() {
    let (services, broken, counting) =
        failing_services(FailurePolicy::FailFast, Concurrency::Concurrent);
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);

    let err = ctx.validate().await.unwrap_err();
    assert!(matches!(
        &err,
        DispatchError::Validator(ValidatorError::Failed { validator, .. }) if validator == "broken"
    ));
    assert!(ctx.validation_messages().is_empty());
    assert_eq!(broken.load(Ordering::SeqCst), 1);
    assert_eq!(counting.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn skip_failed_keeps_the_other_results() {
    let (services, _broken, counting) =
        failing_services(FailurePolicy::SkipFailed, Concurrency::Concurrent);
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);

    assert!(!ctx.validate().await.unwrap());
    assert_eq!(
        ctx.validation_messages(),
        vec![FIRST_NAME_EMPTY, GRADE_OUT_OF_RANGE]
    );
    assert_eq!(counting.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sequential_fail_fast_stops_at_the_first_failure() {
    let (services, broken, counting) =
        failing_services(FailurePolicy::FailFast, Concurrency::Sequential);
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);

    assert!(ctx.validate().await.is_err());
    assert_eq!(broken.load(Ordering::SeqCst), 1);
    assert_eq!(counting.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_validator_times_out() {
    let services = services_with(
        DispatchConfig {
            validator_timeout_ms: Some(50),
            ..DispatchConfig::default()
        },
        vec![
            definition("student", |_| Ok(student_rules())),
            definition("slow", |_| Ok(Slow)),
        ],
    );
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);

    assert_eq!(
        ctx.validate().await,
        Err(DispatchError::Validator(ValidatorError::TimedOut {
            validator: "slow".into(),
            elapsed_ms: 50,
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn timed_out_validator_is_skipped_when_allowed() {
    let services = services_with(
        DispatchConfig {
            validator_timeout_ms: Some(50),
            failure_policy: FailurePolicy::SkipFailed,
            ..DispatchConfig::default()
        },
        vec![
            definition("slow", |_| Ok(Slow)),
            definition("student", |_| Ok(student_rules())),
        ],
    );
    let student = invalid_student();
    let (ctx, _form) = attach(&services, &student);

    assert!(!ctx.validate().await.unwrap());
    assert_eq!(ctx.validation_messages().len(), 2);
}
