//! Document generation pipeline.
//!
//! A [`GenerationPipeline`] runs one template against one case:
//!
//! 1. download the template binary from the blob store,
//! 2. extract its tags, build the case context, detect empty mapped fields,
//! 3. suspend for operator input when fields are missing,
//! 4. merge the input, render, optionally save the input back to the record,
//! 5. run the best-effort tail: archive the document, bump the template's
//!    usage counter, log the generation.
//!
//! The suspension after step 2 is an ordinary state held in memory: dropping
//! a suspended pipeline leaves every store untouched. A run that was resumed
//! always completes its tail; only failures before or during rendering abort
//! it.
//!
//! # Example
//!
//! ```rust,no_run
//! use casedoc::pipeline::{GenerationPipeline, StepOutcome};
//! use casedoc::store::{FsStore, RecordStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = FsStore::open("./case-store")?;
//! let template = store.get_template("poa").await?;
//!
//! let mut pipeline = GenerationPipeline::new(&store, &store);
//! let outcome = match pipeline.start(Some(&template), Some("case-1")).await? {
//!     StepOutcome::Completed(outcome) => outcome,
//!     StepOutcome::AwaitingInput(missing) => {
//!         let values: Vec<(String, String)> =
//!             missing.into_iter().map(|f| (f.path, "n/a".to_string())).collect();
//!         pipeline.resume(&values, false).await?
//!     }
//! };
//! std::fs::write(&outcome.file_name, &outcome.output)?;
//! # Ok(())
//! # }
//! ```

pub mod merge;
pub mod side_effects;
pub mod state;

pub use merge::{StagedUpdate, merge_values};
pub use state::{GenerationOutcome, PipelineState, StepOutcome};

use serde_json::Value;

use self::side_effects::Warnings;
use self::state::SuspendedRun;
use crate::catalog::output_file_name;
use crate::config::GeneratorConfig;
use crate::core::DocgenError;
use crate::models::{AuditEntry, CaseRecord, TemplateReference};
use crate::store::{BlobStore, RecordStore, blob_location};
use crate::templating::{
    Clock, ContextBuilder, DocxRenderer, MissingField, RelatedEntities, SystemClock,
    TemplateRenderer, extractor, missing,
};

/// Run settings taken from [`GeneratorConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Blob bucket holding template binaries
    pub template_bucket: String,
    /// Blob bucket receiving archived documents
    pub generated_bucket: String,
    /// Append a "Generated document" entry to the case's audit log
    pub add_log_entry: bool,
    /// Archive the rendered document onto the case
    pub upload_to_profile: bool,
    /// Largest accepted template binary, in bytes
    pub max_template_size: u64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from(&GeneratorConfig::default())
    }
}

impl From<&GeneratorConfig> for GenerationOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            template_bucket: config.template_bucket.clone(),
            generated_bucket: config.generated_bucket.clone(),
            add_log_entry: config.add_log_entry,
            upload_to_profile: config.upload_to_profile,
            max_template_size: config.max_template_size,
        }
    }
}

/// One generation run of one template for one case.
pub struct GenerationPipeline<'s, R, B, T = DocxRenderer, C: Clock = SystemClock> {
    records: &'s R,
    blobs: &'s B,
    renderer: T,
    contexts: ContextBuilder<C>,
    options: GenerationOptions,
    state: PipelineState,
    suspended: Option<SuspendedRun>,
}

impl<'s, R: RecordStore, B: BlobStore> GenerationPipeline<'s, R, B> {
    /// Pipeline with the DOCX renderer, the system clock and default options.
    pub fn new(records: &'s R, blobs: &'s B) -> Self {
        Self {
            records,
            blobs,
            renderer: DocxRenderer::new(),
            contexts: ContextBuilder::new(),
            options: GenerationOptions::default(),
            state: PipelineState::Idle,
            suspended: None,
        }
    }

    /// Pipeline configured from a [`GeneratorConfig`].
    pub fn from_config(records: &'s R, blobs: &'s B, config: &GeneratorConfig) -> Self {
        Self {
            renderer: DocxRenderer::new().with_linebreaks(config.linebreaks),
            contexts: ContextBuilder::new().with_date_format(config.date_format.clone()),
            options: GenerationOptions::from(config),
            ..Self::new(records, blobs)
        }
    }
}

impl<'s, R, B, T, C> GenerationPipeline<'s, R, B, T, C>
where
    R: RecordStore,
    B: BlobStore,
    T: TemplateRenderer,
    C: Clock,
{
    /// Replace the template renderer.
    pub fn with_renderer<U: TemplateRenderer>(self, renderer: U) -> GenerationPipeline<'s, R, B, U, C> {
        GenerationPipeline {
            records: self.records,
            blobs: self.blobs,
            renderer,
            contexts: self.contexts,
            options: self.options,
            state: self.state,
            suspended: self.suspended,
        }
    }

    /// Replace the context builder, e.g. to inject a fixed clock.
    pub fn with_context_builder<D: Clock>(
        self,
        contexts: ContextBuilder<D>,
    ) -> GenerationPipeline<'s, R, B, T, D> {
        GenerationPipeline {
            records: self.records,
            blobs: self.blobs,
            renderer: self.renderer,
            contexts,
            options: self.options,
            state: self.state,
            suspended: self.suspended,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// Fields awaiting operator input; empty unless the run is suspended.
    pub fn missing_fields(&self) -> &[MissingField] {
        self.suspended.as_ref().map(|run| run.missing.as_slice()).unwrap_or_default()
    }

    /// Context held by a suspended run.
    pub fn context(&self) -> Option<&Value> {
        self.suspended.as_ref().map(|run| &run.context)
    }

    /// Start a run.
    ///
    /// Completes the run directly when no mapped field is empty; otherwise
    /// suspends and returns the fields to ask the operator for.
    ///
    /// # Errors
    ///
    /// Fails with [`DocgenError::MissingInput`] when the template or case id is
    /// absent, [`DocgenError::DownloadFailure`] or
    /// [`DocgenError::MalformedTemplate`] when the template cannot be obtained,
    /// [`DocgenError::CaseNotFound`] for an unknown case, and
    /// [`DocgenError::RenderMismatch`] when rendering fails. No store is
    /// modified by a failed run. Calling `start` twice is an
    /// [`DocgenError::InvalidTransition`].
    pub async fn start(
        &mut self,
        template: Option<&TemplateReference>,
        case_id: Option<&str>,
    ) -> Result<StepOutcome, DocgenError> {
        if self.state != PipelineState::Idle {
            return Err(self.invalid_transition("start"));
        }

        let run = match self.prepare(template, case_id).await {
            Ok(run) => run,
            Err(error) => return Err(self.fail(error)),
        };

        if run.missing.is_empty() {
            tracing::info!("All mapped fields present; rendering '{}'", run.template.name);
            return self.finish(run, None).await.map(StepOutcome::Completed);
        }

        tracing::info!(
            "Awaiting input for {} missing field(s) of '{}'",
            run.missing.len(),
            run.template.name
        );
        let missing = run.missing.clone();
        self.suspended = Some(run);
        self.state = PipelineState::AwaitingInput;
        Ok(StepOutcome::AwaitingInput(missing))
    }

    /// Run only the read-only steps and report the missing fields.
    ///
    /// Nothing is rendered and no store is modified. The pipeline stays in
    /// `FieldCheck` and cannot be started afterwards.
    ///
    /// # Errors
    ///
    /// The same failures as the first steps of [`start`](Self::start).
    pub async fn check(
        &mut self,
        template: Option<&TemplateReference>,
        case_id: Option<&str>,
    ) -> Result<Vec<MissingField>, DocgenError> {
        if self.state != PipelineState::Idle {
            return Err(self.invalid_transition("check"));
        }
        match self.prepare(template, case_id).await {
            Ok(run) => Ok(run.missing),
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Resume a suspended run with operator-supplied `(tag, value)` pairs.
    ///
    /// With `persist`, values of mapped tags are written back to the case
    /// record in a single update, followed by one audit entry listing the
    /// changed fields.
    ///
    /// # Errors
    ///
    /// Fails with [`DocgenError::InvalidTransition`] unless the run is
    /// awaiting input, and with [`DocgenError::RenderMismatch`] when rendering
    /// fails. Failures to save are reported as warnings on the outcome.
    pub async fn resume(
        &mut self,
        values: &[(String, String)],
        persist: bool,
    ) -> Result<GenerationOutcome, DocgenError> {
        let Some(mut run) = self.suspended.take().filter(|_| self.state == PipelineState::AwaitingInput)
        else {
            return Err(self.invalid_transition("resume"));
        };

        self.state = PipelineState::Merging;
        tracing::debug!("Merging {} value(s) (persist: {})", values.len(), persist);
        let staged = match merge_values(&mut run.context, &run.record, values, persist) {
            Ok(staged) => staged,
            Err(error) => return Err(self.fail(error)),
        };

        self.finish(run, staged).await
    }

    async fn prepare(
        &mut self,
        template: Option<&TemplateReference>,
        case_id: Option<&str>,
    ) -> Result<SuspendedRun, DocgenError> {
        let template = template.ok_or_else(|| DocgenError::MissingInput {
            what: "template".to_string(),
        })?;
        let case_id = case_id.filter(|id| !id.is_empty()).ok_or_else(|| DocgenError::MissingInput {
            what: "case id".to_string(),
        })?;

        self.state = PipelineState::TemplateFetching;
        let location = blob_location(&self.options.template_bucket, &template.storage_path);
        tracing::debug!("Downloading template '{}' from {}", template.name, location);
        let template_bytes =
            self.blobs.download(&location).await.map_err(|e| DocgenError::DownloadFailure {
                location: location.clone(),
                reason: e.to_string(),
            })?;
        if template_bytes.len() as u64 > self.options.max_template_size {
            return Err(DocgenError::MalformedTemplate {
                reason: format!(
                    "template is {} bytes, above the {} byte limit",
                    template_bytes.len(),
                    self.options.max_template_size
                ),
            });
        }

        self.state = PipelineState::TagExtraction;
        let tags = extractor::extract(&template_bytes)?;
        let record = self.records.get_case(case_id).await.map_err(|e| {
            if e.is_not_found() {
                DocgenError::CaseNotFound {
                    id: case_id.to_string(),
                }
            } else {
                DocgenError::store("get_case", &e)
            }
        })?;
        let related = self.related_entities(&record).await?;
        let context = self.contexts.build(&record, &related);

        self.state = PipelineState::FieldCheck;
        let missing = missing::detect(&tags, &context);
        tracing::debug!("{} tag(s), {} missing field(s)", tags.len(), missing.len());

        Ok(SuspendedRun {
            template: template.clone(),
            template_bytes,
            record,
            context,
            missing,
        })
    }

    async fn related_entities(
        &self,
        record: &CaseRecord,
    ) -> Result<RelatedEntities, DocgenError> {
        let users = self
            .records
            .get_related_users(&record.assignee_ids)
            .await
            .map_err(|e| DocgenError::store("get_related_users", &e))?;

        let case = &record.immigration_case;
        let office = if case.office_id.is_empty() {
            None
        } else {
            self.records
                .get_office(&case.office_id)
                .await
                .map_err(|e| DocgenError::store("get_office", &e))?
        };
        if office.is_none() && !case.office_id.is_empty() {
            tracing::debug!("Office '{}' not found; office fields stay empty", case.office_id);
        }

        let transfer_office = match (case.is_transferring, case.transfer_office_id.as_deref()) {
            (Some(true), Some(id)) if !id.is_empty() => self
                .records
                .get_office(id)
                .await
                .map_err(|e| DocgenError::store("get_office", &e))?,
            _ => None,
        };

        Ok(RelatedEntities {
            users,
            office,
            transfer_office,
        })
    }

    /// Render, persist and run the tail.
    async fn finish(
        &mut self,
        run: SuspendedRun,
        staged: Option<StagedUpdate>,
    ) -> Result<GenerationOutcome, DocgenError> {
        self.state = PipelineState::Rendering;
        let output = match self.renderer.render(&run.template_bytes, &run.context) {
            Ok(output) => output,
            Err(error) => return Err(self.fail(error.into())),
        };

        let mut warnings = Warnings::default();
        let case_id = run.record.id.as_str();

        let mut record_updated = false;
        if let Some(update) = staged {
            self.state = PipelineState::Persisting;
            let audit_text = update.audit_text();
            let has_notes = !update.notes.is_empty();
            let saved = match update.into_record(case_id) {
                Ok(record) => self.records.update_case(&record).await.map_err(|e| {
                    DocgenError::PersistFailure {
                        case_id: case_id.to_string(),
                        reason: e.to_string(),
                    }
                }),
                Err(error) => Err(error),
            };
            if warnings.collect("Saving corrected fields", saved).is_some() {
                record_updated = true;
                if has_notes {
                    let logged = self
                        .records
                        .append_audit_entry(AuditEntry::new(case_id, audit_text))
                        .await
                        .map_err(|e| DocgenError::PersistFailure {
                            case_id: case_id.to_string(),
                            reason: format!("record saved, but the change log failed: {e}"),
                        });
                    warnings.collect("Logging profile update", logged);
                }
            }
        }

        let file_name = output_file_name(&run.template.name, &run.record.name);
        let archived = if self.options.upload_to_profile {
            let result = side_effects::archive_document(
                self.blobs,
                &self.options.generated_bucket,
                case_id,
                &file_name,
                &output,
            )
            .await;
            warnings.collect("Archiving the document", result)
        } else {
            None
        };

        let usage = side_effects::increment_usage(self.records, &run.template.id).await;
        warnings.collect("Incrementing template usage", usage);

        if self.options.add_log_entry {
            let logged =
                side_effects::log_generation(self.records, case_id, &run.template.name, archived.as_ref())
                    .await;
            warnings.collect("Logging the generation", logged);
        }

        self.state = PipelineState::Done;
        let warnings = warnings.into_vec();
        tracing::info!("Generated '{}' with {} warning(s)", file_name, warnings.len());

        Ok(GenerationOutcome {
            output,
            file_name,
            archived_location: archived.as_ref().map(|file| file.location.clone()),
            archived_url: archived.map(|file| file.url),
            record_updated,
            warnings,
        })
    }

    fn fail(&mut self, error: DocgenError) -> DocgenError {
        tracing::warn!("Generation failed while {}: {}", self.state, error);
        self.state = PipelineState::Error;
        self.suspended = None;
        error
    }

    fn invalid_transition(&self, action: &str) -> DocgenError {
        DocgenError::InvalidTransition {
            action: action.to_string(),
            state: self.state.to_string(),
        }
    }
}
