//! Validation runs: look up validators, run them, map their entries to
//! fields and commit the messages.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fieldwise_core::{
    ErrorEntry, FieldIdentifier, ModelCatalog, ModelRef, Scope, ValidatorError, ValidatorHandle,
};
use futures::future::join_all;
use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::{Concurrency, DispatchConfig, FailurePolicy};
use crate::edit::EditContext;
use crate::error::DispatchError;
use crate::messages::MessageStore;
use crate::path::FieldPathResolver;
use crate::registry::ValidatorRegistry;
use crate::walker::ObjectGraphWalker;

/// Phase of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not running.
    Idle,
    /// Previous messages are about to be dropped.
    Clearing,
    /// Validators are executing.
    Running,
    /// Results are being mapped to fields and committed.
    Reporting,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Clearing => "clearing",
            Self::Running => "running",
            Self::Reporting => "reporting",
        })
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run committed its messages.
    Completed {
        /// Whether the validated scope has no messages after the commit.
        valid: bool,
    },
    /// A newer run already committed; this run's results were discarded.
    Superseded,
}

impl RunOutcome {
    /// Whether the run committed and found nothing wrong.
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Completed { valid: true })
    }
}

/// Ticket bookkeeping for newest-started-wins commits.
#[derive(Debug, Default)]
struct Ledger {
    whole_model: u64,
    fields: HashMap<FieldIdentifier, u64>,
}

/// Runs the registered validators for one edit context and keeps its
/// message store current.
///
/// Every run draws a ticket when it starts. When two runs overlap, the one
/// that started last wins: an older run that finishes late is discarded
/// with [`RunOutcome::Superseded`] instead of overwriting newer messages.
pub struct ValidationDispatcher {
    catalog: Arc<ModelCatalog>,
    registry: Arc<ValidatorRegistry>,
    store: Arc<MessageStore>,
    config: DispatchConfig,
    ledger: Mutex<Ledger>,
    next_ticket: AtomicU64,
}

impl ValidationDispatcher {
    /// Creates a dispatcher committing into `store`.
    pub fn new(
        catalog: Arc<ModelCatalog>,
        registry: Arc<ValidatorRegistry>,
        store: Arc<MessageStore>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            catalog,
            registry,
            store,
            config,
            ledger: Mutex::new(Ledger::default()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// The store this dispatcher commits into.
    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    /// The dispatch settings.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Validates the whole model of `ctx`.
    ///
    /// Every reachable field is marked touched first. On success the store
    /// holds exactly the messages of this run, except for fields committed
    /// by newer single-field runs.
    pub async fn validate_model(
        &self,
        ctx: &EditContext,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DispatchError> {
        let ticket = self.issue_ticket();
        let model = ctx.model().cloned().ok_or(DispatchError::MissingModel)?;
        let model_type = model.model_type();
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        trace_state(ticket, "model", RunState::Clearing);
        ObjectGraphWalker::new(&self.catalog).walk_model(&model, |owner, field| {
            ctx.mark_touched(FieldIdentifier::new(owner, field));
        })?;
        ctx.notify_validation_state_changed();

        trace_state(ticket, "model", RunState::Running);
        let entries = self.run_validators(&model, Scope::Whole, cancel).await?;

        trace_state(ticket, "model", RunState::Reporting);
        let resolver = FieldPathResolver::new(&self.catalog);
        let mut messages: IndexMap<FieldIdentifier, Vec<String>> = IndexMap::new();
        for entry in entries {
            let field = resolver.resolve(&model, &entry.property_path)?;
            messages.entry(field).or_default().push(entry.message);
        }

        let outcome = self.commit_model(ticket, messages, cancel)?;
        if outcome != RunOutcome::Superseded {
            ctx.notify_validation_state_changed();
        }
        trace_state(ticket, "model", RunState::Idle);
        tracing::debug!(ticket, model_type = %model_type, ?outcome, "model validation finished");
        Ok(outcome)
    }

    /// Validates one field.
    ///
    /// Only the validators of the owning instance's type run, restricted to
    /// the field. Repeated messages are kept once.
    pub async fn validate_field(
        &self,
        ctx: &EditContext,
        field: &FieldIdentifier,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DispatchError> {
        let ticket = self.issue_ticket();
        let owner = field.model().ok_or_else(|| DispatchError::OwnerDropped {
            field: field.clone(),
        })?;
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        trace_state(ticket, "field", RunState::Clearing);
        ctx.notify_validation_state_changed();

        trace_state(ticket, "field", RunState::Running);
        let scope = Scope::field(field.field_name());
        let entries = self.run_validators(&owner, scope, cancel).await?;

        trace_state(ticket, "field", RunState::Reporting);
        let messages: IndexSet<String> = entries.into_iter().map(|entry| entry.message).collect();
        let outcome = self.commit_field(ticket, field, messages.into_iter().collect(), cancel)?;
        if outcome != RunOutcome::Superseded {
            let pruned = ctx.prune_dropped_fields();
            if pruned > 0 {
                tracing::trace!(ticket, pruned, "dropped field state pruned");
            }
            ctx.notify_validation_state_changed();
        }
        trace_state(ticket, "field", RunState::Idle);
        Ok(outcome)
    }

    fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    async fn run_validators(
        &self,
        model: &ModelRef,
        scope: Scope,
        cancel: &CancellationToken,
    ) -> Result<Vec<ErrorEntry>, DispatchError> {
        let validators = self.registry.lookup(model.model_type());
        if validators.is_empty() {
            tracing::debug!(model_type = %model.model_type(), "no validators registered");
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DispatchError::Cancelled),
            result = self.run_all(validators, model, &scope) => result,
        }
    }

    /// Runs `validators` and concatenates their entries in registration
    /// order, applying the failure policy.
    async fn run_all(
        &self,
        validators: &[ValidatorHandle],
        model: &ModelRef,
        scope: &Scope,
    ) -> Result<Vec<ErrorEntry>, DispatchError> {
        let results = match self.config.concurrency {
            Concurrency::Concurrent => {
                join_all(validators.iter().map(|v| self.run_one(v, model, scope))).await
            }
            Concurrency::Sequential => {
                let mut results = Vec::with_capacity(validators.len());
                for validator in validators {
                    let result = self.run_one(validator, model, scope).await;
                    let stop =
                        result.is_err() && self.config.failure_policy == FailurePolicy::FailFast;
                    results.push(result);
                    if stop {
                        break;
                    }
                }
                results
            }
        };

        let mut entries = Vec::new();
        for (validator, result) in validators.iter().zip(results) {
            match (result, self.config.failure_policy) {
                (Ok(found), _) => entries.extend(found),
                (Err(err), FailurePolicy::FailFast) => return Err(err.into()),
                (Err(err), FailurePolicy::SkipFailed) => {
                    tracing::warn!(
                        validator = validator.name(),
                        error = %err,
                        "validator failed, skipping its results"
                    );
                }
            }
        }
        Ok(entries)
    }

    async fn run_one(
        &self,
        validator: &ValidatorHandle,
        model: &ModelRef,
        scope: &Scope,
    ) -> Result<Vec<ErrorEntry>, ValidatorError> {
        let run = validator.validate_model(Arc::clone(model), scope.clone());
        let Some(limit) = self.config.validator_timeout() else {
            return run.await;
        };
        tokio::time::timeout(limit, run)
            .await
            .map_err(|_| ValidatorError::TimedOut {
                validator: validator.name().to_owned(),
                elapsed_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    fn commit_model(
        &self,
        ticket: u64,
        messages: IndexMap<FieldIdentifier, Vec<String>>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DispatchError> {
        let mut ledger = self.ledger.lock();
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        if ledger.whole_model > ticket {
            tracing::warn!(
                ticket,
                newer = ledger.whole_model,
                "stale model validation discarded"
            );
            return Ok(RunOutcome::Superseded);
        }

        let newer_fields: HashSet<FieldIdentifier> = ledger
            .fields
            .iter()
            .filter(|&(_, &committed)| committed > ticket)
            .map(|(field, _)| field.clone())
            .collect();
        self.store.replace_all_except(messages, &newer_fields);

        ledger.whole_model = ticket;
        ledger.fields.retain(|_, committed| *committed > ticket);
        Ok(RunOutcome::Completed {
            valid: self.store.is_empty(),
        })
    }

    fn commit_field(
        &self,
        ticket: u64,
        field: &FieldIdentifier,
        messages: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DispatchError> {
        let mut ledger = self.ledger.lock();
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        let newer = ledger
            .fields
            .get(field)
            .copied()
            .unwrap_or_default()
            .max(ledger.whole_model);
        if newer > ticket {
            tracing::warn!(ticket, newer, %field, "stale field validation discarded");
            return Ok(RunOutcome::Superseded);
        }

        self.store.replace_field(field.clone(), messages);
        self.store.prune_dropped();
        ledger.fields.retain(|tracked, _| tracked.is_live());
        ledger.fields.insert(field.clone(), ticket);
        Ok(RunOutcome::Completed {
            valid: self.store.messages_for(field).is_empty(),
        })
    }
}

impl fmt::Debug for ValidationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationDispatcher")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("messages", &self.store.len())
            .finish_non_exhaustive()
    }
}

fn trace_state(ticket: u64, run: &'static str, state: RunState) {
    tracing::debug!(ticket, run, state = %state, "validation run state");
}
