//! Job executor
//!
//! Performs the single remote call (or short call sequence) behind one job
//! attempt. Remote ids produced by dependencies are looked up in the outputs
//! collected so far; a missing output is a terminal error.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use zigzag_client::{ClientError, QTestApi, Result};
use zigzag_core::domain::job::{JobId, JobPayload, ModuleRef};
use zigzag_core::domain::link::LinkKind;
use zigzag_core::dto::link::ExternalLink;
use zigzag_core::dto::module::CreateModule;

/// Remote ids produced by succeeded jobs
pub type Outputs = HashMap<JobId, u64>;

/// Runs job payloads against one project
#[derive(Clone)]
pub struct JobExecutor {
    api: Arc<dyn QTestApi>,
    project_id: u64,
}

impl JobExecutor {
    pub fn new(api: Arc<dyn QTestApi>, project_id: u64) -> Self {
        Self { api, project_id }
    }

    /// Executes one attempt of `payload`
    ///
    /// Returns the remote id the job produced, if its kind produces one:
    /// module id, run id, or test case id for submitted results.
    pub async fn execute(&self, payload: &JobPayload, outputs: &Outputs) -> Result<Option<u64>> {
        match payload {
            JobPayload::CreateModule { name, parent } => {
                let parent_id = module_id(parent, outputs)?;
                let module = self
                    .api
                    .create_module(
                        self.project_id,
                        parent_id,
                        CreateModule {
                            name: name.clone(),
                            description: None,
                        },
                    )
                    .await?;
                debug!("Created module '{}' (id {})", module.name, module.id);
                Ok(Some(module.id))
            }

            JobPayload::CreateRun(request) => {
                let run = self
                    .api
                    .create_test_run(self.project_id, request.clone())
                    .await?;
                debug!("Created test run '{}' (id {})", run.name, run.id);
                Ok(Some(run.id))
            }

            JobPayload::SubmitResult {
                run, module, result, ..
            } => {
                let run_id = output_of(*run, outputs)?;
                let mut result = result.clone();
                result.module_id = module_id(module, outputs)?;

                let submitted = self
                    .api
                    .submit_test_result(self.project_id, run_id, result)
                    .await?;
                Ok(Some(submitted.test_case_id))
            }

            JobPayload::AttachLink { link, result } => {
                let test_case_id = output_of(*result, outputs)?;

                match link.kind {
                    LinkKind::Requirement => {
                        let requirement = self
                            .api
                            .find_requirement(self.project_id, &link.target)
                            .await?
                            .ok_or_else(|| {
                                ClientError::NotFound(format!("requirement {}", link.target))
                            })?;
                        self.api
                            .link_requirement(self.project_id, requirement.id, test_case_id)
                            .await?;
                    }
                    LinkKind::Github => {
                        let url = link.github_url().ok_or_else(|| {
                            ClientError::InvalidRequest(format!(
                                "not a GitHub reference: {}",
                                link.target
                            ))
                        })?;
                        self.api
                            .attach_external_link(
                                self.project_id,
                                test_case_id,
                                ExternalLink {
                                    url,
                                    label: link.target.clone(),
                                },
                            )
                            .await?;
                    }
                }
                Ok(None)
            }
        }
    }
}

fn output_of(job: JobId, outputs: &Outputs) -> Result<u64> {
    outputs
        .get(&job)
        .copied()
        .ok_or_else(|| ClientError::InternalError(format!("job {} produced no remote id", job)))
}

fn module_id(module: &ModuleRef, outputs: &Outputs) -> Result<Option<u64>> {
    match module {
        ModuleRef::Root => Ok(None),
        ModuleRef::Remote(id) => Ok(Some(*id)),
        ModuleRef::Job(job) => output_of(*job, outputs).map(Some),
    }
}
