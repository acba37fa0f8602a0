use std::future::Future;
use std::sync::Arc;

use bk_registry::{
    FileProjectRegistry, InMemoryProjectRegistry, ProjectRecord, ProjectRegistry,
};
use bk_session::{Admission, Session};
use bk_store::{
    AssetMeta, BlobStore, FileBlobStore, FileStoreConfig, InMemoryBlobStore, NewAsset,
    StoreError, StoreResult,
};
use bk_types::{AssetId, Category, ProjectName};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborators::{ImageGenerator, PromptGenerator, UpstreamError};
use crate::config::{Backend, StudioConfig};
use crate::error::{StudioError, StudioResult};
use crate::prompt::{GenerationRequest, PromptComposer};

/// A stored generation result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generated {
    /// The new generated asset, now selected.
    pub id: AssetId,
    /// Display name it was stored under.
    pub filename: String,
    /// Final prompt sent to the image generator.
    pub prompt: String,
}

/// Outcome of a project deletion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeletion {
    /// Assets removed from the store.
    pub assets_removed: usize,
    /// Whether the project record existed.
    pub existed: bool,
}

/// High-level brandkit API.
///
/// Owns the blob store and the project registry. Per-user state is an
/// explicit [`Session`] passed to every operation that needs it.
pub struct Studio {
    store: Arc<dyn BlobStore>,
    registry: Arc<dyn ProjectRegistry>,
    config: StudioConfig,
}

impl Studio {
    /// Open a studio with the backends named in `config`.
    pub fn open(config: StudioConfig) -> StudioResult<Self> {
        let (store, registry): (Arc<dyn BlobStore>, Arc<dyn ProjectRegistry>) =
            match config.backend {
                Backend::Memory => (
                    Arc::new(InMemoryBlobStore::new()),
                    Arc::new(InMemoryProjectRegistry::new()),
                ),
                Backend::File => {
                    let store = FileBlobStore::open(
                        &config.root,
                        FileStoreConfig {
                            sync_mode: config.sync,
                            ..FileStoreConfig::default()
                        },
                    )?;
                    let swept = store.sweep_orphans()?;
                    if swept > 0 {
                        warn!(swept, "removed orphan content files on open");
                    }
                    let registry = FileProjectRegistry::open(&config.root)?;
                    (Arc::new(store), Arc::new(registry))
                }
            };

        info!(backend = ?config.backend, root = %config.root.display(), "studio opened");
        Ok(Self::with_backends(store, registry, config))
    }

    /// An ephemeral in-memory studio.
    pub fn in_memory() -> Self {
        Self::with_backends(
            Arc::new(InMemoryBlobStore::new()),
            Arc::new(InMemoryProjectRegistry::new()),
            StudioConfig::ephemeral(),
        )
    }

    /// A studio over caller-supplied backends.
    pub fn with_backends(
        store: Arc<dyn BlobStore>,
        registry: Arc<dyn ProjectRegistry>,
        config: StudioConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    /// A fresh session with no active project.
    pub fn new_session(&self) -> Session {
        Session::new(self.config.selection_fallback)
    }

    // ---- Projects ----

    pub fn create_project(&self, name: &ProjectName) -> StudioResult<ProjectRecord> {
        let record = self.registry.create(name)?;
        info!(project = %name, "project created");
        Ok(record)
    }

    pub fn list_projects(&self) -> StudioResult<Vec<ProjectRecord>> {
        Ok(self.registry.list()?)
    }

    pub fn project_exists(&self, name: &ProjectName) -> StudioResult<bool> {
        Ok(self.registry.exists(name)?)
    }

    /// Delete a project and everything scoped to it.
    ///
    /// Assets go first, then the project record, then session state. Each
    /// step is idempotent, so rerunning after an interruption finishes the
    /// job. Deleting an unknown project is a no-op.
    pub fn delete_project(
        &self,
        session: &mut Session,
        name: &ProjectName,
    ) -> StudioResult<ProjectDeletion> {
        let assets_removed = self.store.delete_all(name)?;
        let existed = self.registry.delete(name)?;
        session.on_project_deleted(name);

        if existed || assets_removed > 0 {
            info!(project = %name, assets_removed, "project deleted");
        } else {
            debug!(project = %name, "delete of unknown project ignored");
        }
        Ok(ProjectDeletion {
            assets_removed,
            existed,
        })
    }

    /// A session with `name` active. The project must exist.
    pub fn open_session(&self, name: &ProjectName) -> StudioResult<Session> {
        self.require_project(name)?;
        Ok(Session::for_project(name.clone(), self.config.selection_fallback))
    }

    pub fn switch_project(&self, session: &mut Session, name: &ProjectName) -> StudioResult<()> {
        self.require_project(name)?;
        session.switch_to(name.clone());
        Ok(())
    }

    // ---- Assets ----

    /// Upload a reference image into the active project, deduplicated by content.
    pub fn upload_reference(
        &self,
        session: &mut Session,
        filename: &str,
        content: Vec<u8>,
    ) -> StudioResult<Admission> {
        self.active_project(session)?;
        Ok(session.admit_reference(self.store.as_ref(), filename, content)?)
    }

    /// Upload several references. Stops at the first failure.
    pub fn upload_references(
        &self,
        session: &mut Session,
        files: Vec<(String, Vec<u8>)>,
    ) -> StudioResult<Vec<Admission>> {
        self.active_project(session)?;
        files
            .into_iter()
            .map(|(filename, content)| -> StudioResult<Admission> {
                Ok(session.admit_reference(self.store.as_ref(), &filename, content)?)
            })
            .collect()
    }

    /// Store a user-supplied image as a generated asset and select it, so it
    /// can be edited like any generation result.
    pub fn import_for_edit(
        &self,
        session: &mut Session,
        filename: &str,
        content: Vec<u8>,
    ) -> StudioResult<AssetId> {
        self.record_generated(session, filename, content)
    }

    /// Store collaborator output in the active project and select it.
    pub fn record_generated(
        &self,
        session: &mut Session,
        filename: &str,
        content: Vec<u8>,
    ) -> StudioResult<AssetId> {
        if content.is_empty() {
            return Err(StudioError::EmptyImage);
        }
        let project = self.active_project(session)?;
        let size = content.len();
        let id = self
            .store
            .put(NewAsset::generated(project.clone(), filename, content))?;
        session.select(self.store.as_ref(), id)?;
        info!(id = %id, project = %project, filename, size, "generated asset stored");
        Ok(id)
    }

    pub fn list_assets(
        &self,
        project: &ProjectName,
        category: Category,
    ) -> StudioResult<Vec<AssetMeta>> {
        self.read_with_retry(|| self.store.list(project, category))
    }

    pub fn asset_meta(&self, id: &AssetId) -> StudioResult<AssetMeta> {
        self.read_with_retry(|| self.store.meta(id))?
            .ok_or(StudioError::AssetNotFound(*id))
    }

    pub fn asset_content(&self, id: &AssetId) -> StudioResult<Vec<u8>> {
        match self.read_with_retry(|| self.store.get(id)) {
            Err(StudioError::Store(StoreError::NotFound(missing))) => {
                Err(StudioError::AssetNotFound(missing))
            }
            other => other,
        }
    }

    /// Delete an asset and repair any cursor that pointed at it.
    pub fn delete_asset(&self, session: &mut Session, id: &AssetId) -> StudioResult<bool> {
        let existed = self.store.delete(id)?;
        session.on_delete(self.store.as_ref(), id)?;
        debug!(id = %id, existed, "asset delete");
        Ok(existed)
    }

    pub fn select(&self, session: &mut Session, id: AssetId) -> StudioResult<()> {
        Ok(session.select(self.store.as_ref(), id)?)
    }

    pub fn current(&self, session: &mut Session) -> StudioResult<Option<AssetId>> {
        Ok(session.current(self.store.as_ref())?)
    }

    // ---- Generation ----

    /// Generate one image for a post and select it.
    pub async fn generate(
        &self,
        session: &mut Session,
        prompts: &dyn PromptGenerator,
        images: &dyn ImageGenerator,
        request: &GenerationRequest,
    ) -> StudioResult<Generated> {
        require_text(&request.post, "post")?;
        self.active_project(session)?;

        let base = self.call("prompt generation", prompts.generate(&request.post)).await?;
        self.render(session, images, &base, request.instructions()).await
    }

    /// Split a post into `parts` sections (the configured series size when
    /// `None`) and generate one image per section.
    ///
    /// Returns one result per section. A failed section does not stop the
    /// others.
    pub async fn generate_series(
        &self,
        session: &mut Session,
        prompts: &dyn PromptGenerator,
        images: &dyn ImageGenerator,
        request: &GenerationRequest,
        parts: Option<usize>,
    ) -> StudioResult<Vec<StudioResult<Generated>>> {
        require_text(&request.post, "post")?;
        let parts = parts.unwrap_or(self.config.default_series_size);
        if parts == 0 {
            return Err(StudioError::InvalidInput("series size must be at least 1".into()));
        }
        self.active_project(session)?;

        let sections = self
            .call("post partitioning", prompts.partition(&request.post, parts))
            .await?;
        if sections.len() != parts {
            warn!(
                requested = parts,
                returned = sections.len(),
                "partition size differs from request"
            );
        }

        let mut results = Vec::with_capacity(sections.len());
        for (index, section) in sections.iter().enumerate() {
            let result = match self.call("prompt generation", prompts.generate(section)).await {
                Ok(base) => self.render(session, images, &base, request.instructions()).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!(part = index + 1, error = %e, "series part failed");
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Edit the currently selected asset and select the result.
    pub async fn edit(
        &self,
        session: &mut Session,
        images: &dyn ImageGenerator,
        instructions: &str,
    ) -> StudioResult<Generated> {
        require_text(instructions, "edit instructions")?;
        let project = self.active_project(session)?;
        let selected = self
            .current(session)?
            .ok_or_else(|| StudioError::NoSelection(project.clone()))?;
        let original = self.asset_content(&selected)?;

        let edited = self
            .call("image edit", images.edit(instructions.trim(), &original))
            .await?;
        let filename = timestamped("edited");
        let id = self.record_generated(session, &filename, edited)?;
        Ok(Generated {
            id,
            filename,
            prompt: instructions.trim().to_string(),
        })
    }

    async fn render(
        &self,
        session: &mut Session,
        images: &dyn ImageGenerator,
        base: &str,
        instructions: Option<&str>,
    ) -> StudioResult<Generated> {
        if base.trim().is_empty() {
            warn!("prompt generator returned an empty prompt");
            return Err(StudioError::EmptyPrompt);
        }

        let project = self.active_project(session)?;
        let references = self
            .list_assets(&project, Category::Reference)?
            .iter()
            .map(|meta| self.asset_content(&meta.id))
            .collect::<StudioResult<Vec<_>>>()?;

        let prompt = PromptComposer::compose(base, !references.is_empty(), instructions);
        debug!(references = references.len(), prompt = %prompt, "rendering image");

        let image = self
            .call("image generation", images.generate(&prompt, &references))
            .await?;
        let filename = timestamped("generated");
        let id = self.record_generated(session, &filename, image)?;
        Ok(Generated {
            id,
            filename,
            prompt,
        })
    }

    // ---- Helpers ----

    fn require_project(&self, name: &ProjectName) -> StudioResult<()> {
        if self.registry.exists(name)? {
            Ok(())
        } else {
            Err(StudioError::ProjectNotFound(name.clone()))
        }
    }

    fn active_project(&self, session: &Session) -> StudioResult<ProjectName> {
        let project = session.require_active()?.clone();
        self.require_project(&project)?;
        Ok(project)
    }

    async fn call<T, F>(&self, what: &'static str, fut: F) -> StudioResult<T>
    where
        F: Future<Output = Result<T, UpstreamError>>,
    {
        let after = self.config.request_timeout();
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result.map_err(|e| {
                warn!(what, error = %e, "collaborator call failed");
                StudioError::Upstream(e)
            }),
            Err(_) => {
                warn!(what, timeout = ?after, "collaborator call timed out");
                Err(StudioError::Timeout { what, after })
            }
        }
    }

    fn read_with_retry<T>(&self, op: impl Fn() -> StoreResult<T>) -> StudioResult<T> {
        match op() {
            Err(e) if e.is_transient() && self.config.retry_transient_once => {
                warn!(error = %e, "transient store failure; retrying once");
                Ok(op()?)
            }
            result => Ok(result?),
        }
    }
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("backend", &self.config.backend)
            .field("root", &self.config.root)
            .finish()
    }
}

fn require_text(value: &str, what: &str) -> StudioResult<()> {
    if value.trim().is_empty() {
        Err(StudioError::InvalidInput(format!("{what} is blank")))
    } else {
        Ok(())
    }
}

fn timestamped(prefix: &str) -> String {
    format!("{prefix}_{}.png", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use async_trait::async_trait;
    use bk_session::FallbackPolicy;

    fn project(name: &str) -> ProjectName {
        ProjectName::new(name).unwrap()
    }

    fn studio_with(name: &str) -> (Studio, Session) {
        let studio = Studio::in_memory();
        studio.create_project(&project(name)).unwrap();
        let session = studio.open_session(&project(name)).unwrap();
        (studio, session)
    }

    struct FixedPrompts {
        prompt: String,
    }

    #[async_trait]
    impl PromptGenerator for FixedPrompts {
        async fn generate(&self, post: &str) -> Result<String, UpstreamError> {
            if self.prompt.is_empty() {
                return Ok(String::new());
            }
            Ok(format!("{} for {post}", self.prompt))
        }

        async fn partition(&self, post: &str, parts: usize) -> Result<Vec<String>, UpstreamError> {
            Ok((1..=parts).map(|i| format!("{post} part {i}")).collect())
        }
    }

    #[derive(Default)]
    struct RecordingImages {
        prompts: Mutex<Vec<String>>,
        reference_counts: Mutex<Vec<usize>>,
        fail_on_call: Option<usize>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerator for RecordingImages {
        async fn generate(
            &self,
            prompt: &str,
            references: &[Vec<u8>],
        ) -> Result<Vec<u8>, UpstreamError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call == Some(call) {
                return Err(UpstreamError::Request("quota exceeded".into()));
            }
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reference_counts.lock().unwrap().push(references.len());
            Ok(format!("image:{prompt}").into_bytes())
        }

        async fn edit(&self, instructions: &str, image: &[u8]) -> Result<Vec<u8>, UpstreamError> {
            let mut out = image.to_vec();
            out.extend_from_slice(format!("+{instructions}").as_bytes());
            Ok(out)
        }
    }

    struct SlowImages;

    #[async_trait]
    impl ImageGenerator for SlowImages {
        async fn generate(&self, _: &str, _: &[Vec<u8>]) -> Result<Vec<u8>, UpstreamError> {
            tokio::time::sleep(SLOW_CALL).await;
            Ok(b"late".to_vec())
        }

        async fn edit(&self, _: &str, _: &[u8]) -> Result<Vec<u8>, UpstreamError> {
            tokio::time::sleep(SLOW_CALL).await;
            Ok(b"late".to_vec())
        }
    }

    const SLOW_CALL: Duration = Duration::from_secs(30);

    fn prompts() -> FixedPrompts {
        FixedPrompts {
            prompt: "a bold poster".into(),
        }
    }

    // ---- Projects ----

    #[test]
    fn create_and_list_projects() {
        let studio = Studio::in_memory();
        studio.create_project(&project("zeta")).unwrap();
        studio.create_project(&project("alpha")).unwrap();
        let names: Vec<String> = studio
            .list_projects()
            .unwrap()
            .into_iter()
            .map(|r| r.name.to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert!(matches!(
            studio.create_project(&project("alpha")),
            Err(StudioError::Registry(bk_registry::RegistryError::AlreadyExists { .. }))
        ));
    }

    #[test]
    fn open_session_requires_project() {
        let studio = Studio::in_memory();
        assert!(matches!(
            studio.open_session(&project("ghost")),
            Err(StudioError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn delete_project_cascades() {
        let (studio, mut session) = studio_with("demo");
        studio.upload_reference(&mut session, "a.png", b"B1".to_vec()).unwrap();
        studio.record_generated(&mut session, "g.png", b"G1".to_vec()).unwrap();

        let deletion = studio.delete_project(&mut session, &project("demo")).unwrap();
        assert_eq!(deletion, ProjectDeletion { assets_removed: 2, existed: true });
        for category in Category::ALL {
            assert!(studio.list_assets(&project("demo"), category).unwrap().is_empty());
        }
        assert!(!studio.project_exists(&project("demo")).unwrap());
        assert!(session.active().is_none());
        assert!(session.cursors().is_empty());

        let again = studio.delete_project(&mut session, &project("demo")).unwrap();
        assert_eq!(again, ProjectDeletion { assets_removed: 0, existed: false });
    }

    #[test]
    fn interrupted_cascade_completes_on_rerun() {
        let (studio, mut session) = studio_with("demo");
        studio.upload_reference(&mut session, "a.png", b"B1".to_vec()).unwrap();

        // Simulate a crash after the asset step but before the registry step.
        studio.store().delete_all(&project("demo")).unwrap();
        assert!(studio.project_exists(&project("demo")).unwrap());

        let deletion = studio.delete_project(&mut session, &project("demo")).unwrap();
        assert!(deletion.existed);
        assert!(!studio.project_exists(&project("demo")).unwrap());
    }

    #[test]
    fn switch_project_keeps_cursors() {
        let studio = Studio::in_memory();
        studio.create_project(&project("demo")).unwrap();
        studio.create_project(&project("other")).unwrap();
        let mut session = studio.open_session(&project("demo")).unwrap();

        let d = studio.record_generated(&mut session, "d.png", b"D".to_vec()).unwrap();
        studio.switch_project(&mut session, &project("other")).unwrap();
        assert_eq!(studio.current(&mut session).unwrap(), None);

        studio.switch_project(&mut session, &project("demo")).unwrap();
        assert_eq!(studio.current(&mut session).unwrap(), Some(d));
        assert!(matches!(
            studio.switch_project(&mut session, &project("ghost")),
            Err(StudioError::ProjectNotFound(_))
        ));
    }

    // ---- Uploads ----

    #[test]
    fn dedup_scenario() {
        let studio = Studio::in_memory();
        studio.create_project(&project("demo")).unwrap();
        studio.create_project(&project("other")).unwrap();

        let mut demo = studio.open_session(&project("demo")).unwrap();
        let x = studio.upload_reference(&mut demo, "a.png", b"B1".to_vec()).unwrap();
        let again = studio.upload_reference(&mut demo, "b.png", b"B1".to_vec()).unwrap();
        assert!(x.created);
        assert_eq!(again, Admission { id: x.id, created: false });

        let mut other = studio.open_session(&project("other")).unwrap();
        let y = studio.upload_reference(&mut other, "a.png", b"B1".to_vec()).unwrap();
        assert!(y.created);
        assert_ne!(y.id, x.id);
    }

    #[test]
    fn reupload_after_delete_by_another_session() {
        let (studio, mut a) = studio_with("demo");
        let mut b = studio.open_session(&project("demo")).unwrap();

        let first = studio.upload_reference(&mut a, "a.png", b"B1".to_vec()).unwrap();
        assert!(studio.delete_asset(&mut b, &first.id).unwrap());

        let again = studio.upload_reference(&mut a, "a.png", b"B1".to_vec()).unwrap();
        assert!(again.created);
        assert_ne!(again.id, first.id);
        assert!(studio.asset_meta(&again.id).is_ok());
        let listed = studio.list_assets(&project("demo"), Category::Reference).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, again.id);
    }

    #[test]
    fn upload_into_deleted_project_fails() {
        let (studio, mut session) = studio_with("demo");
        let mut stale = session.clone();
        studio.delete_project(&mut session, &project("demo")).unwrap();

        assert!(matches!(
            studio.upload_reference(&mut stale, "a.png", b"B1".to_vec()),
            Err(StudioError::ProjectNotFound(_))
        ));
        assert!(studio.list_assets(&project("demo"), Category::Reference).unwrap().is_empty());
    }

    #[test]
    fn batch_upload_reports_each_file() {
        let (studio, mut session) = studio_with("demo");
        let admissions = studio
            .upload_references(
                &mut session,
                vec![
                    ("a.png".into(), b"1".to_vec()),
                    ("b.png".into(), b"2".to_vec()),
                    ("c.png".into(), b"1".to_vec()),
                ],
            )
            .unwrap();
        assert_eq!(admissions.len(), 3);
        assert_eq!(admissions[2].id, admissions[0].id);
        assert!(!admissions[2].created);
        assert_eq!(studio.list_assets(&project("demo"), Category::Reference).unwrap().len(), 2);
    }

    #[test]
    fn import_for_edit_is_generated_and_selected() {
        let (studio, mut session) = studio_with("demo");
        let a = studio.import_for_edit(&mut session, "mine.png", b"same".to_vec()).unwrap();
        let b = studio.import_for_edit(&mut session, "mine.png", b"same".to_vec()).unwrap();
        assert_ne!(a, b);
        assert_eq!(studio.current(&mut session).unwrap(), Some(b));
        assert_eq!(studio.asset_meta(&a).unwrap().category, Category::Generated);
    }

    #[test]
    fn empty_generated_image_is_rejected() {
        let (studio, mut session) = studio_with("demo");
        assert!(matches!(
            studio.record_generated(&mut session, "g.png", Vec::new()),
            Err(StudioError::EmptyImage)
        ));
        assert!(studio.list_assets(&project("demo"), Category::Generated).unwrap().is_empty());
    }

    #[test]
    fn delete_selected_asset_falls_back() {
        let (studio, mut session) = studio_with("demo");
        let g1 = studio.record_generated(&mut session, "g1.png", b"1".to_vec()).unwrap();
        let g2 = studio.record_generated(&mut session, "g2.png", b"2".to_vec()).unwrap();
        assert_eq!(studio.current(&mut session).unwrap(), Some(g2));

        assert!(studio.delete_asset(&mut session, &g2).unwrap());
        assert_eq!(studio.current(&mut session).unwrap(), Some(g1));
        assert!(!studio.delete_asset(&mut session, &g2).unwrap());
    }

    #[test]
    fn clear_fallback_from_config() {
        let mut config = StudioConfig::ephemeral();
        config.selection_fallback = FallbackPolicy::Clear;
        let studio = Studio::open(config).unwrap();
        studio.create_project(&project("demo")).unwrap();
        let mut session = studio.open_session(&project("demo")).unwrap();

        studio.record_generated(&mut session, "g1.png", b"1".to_vec()).unwrap();
        let g2 = studio.record_generated(&mut session, "g2.png", b"2".to_vec()).unwrap();
        studio.delete_asset(&mut session, &g2).unwrap();
        assert_eq!(studio.current(&mut session).unwrap(), None);
    }

    #[test]
    fn missing_asset_content_is_not_found() {
        let studio = Studio::in_memory();
        let id = AssetId::new();
        assert!(matches!(studio.asset_content(&id), Err(StudioError::AssetNotFound(m)) if m == id));
        assert!(matches!(studio.asset_meta(&id), Err(StudioError::AssetNotFound(_))));
    }

    #[test]
    fn file_backend_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let studio = Studio::open(StudioConfig::at(dir.path())).unwrap();
            studio.create_project(&project("demo")).unwrap();
            let mut session = studio.open_session(&project("demo")).unwrap();
            studio.upload_reference(&mut session, "a.png", b"B1".to_vec()).unwrap().id
        };

        let studio = Studio::open(StudioConfig::at(dir.path())).unwrap();
        assert!(studio.project_exists(&project("demo")).unwrap());
        assert_eq!(studio.asset_content(&id).unwrap(), b"B1");

        let mut session = studio.open_session(&project("demo")).unwrap();
        let again = studio.upload_reference(&mut session, "b.png", b"B1".to_vec()).unwrap();
        assert_eq!(again, Admission { id, created: false });
    }

    // ---- Generation ----

    #[tokio::test]
    async fn generate_composes_prompt_and_selects_result() {
        let (studio, mut session) = studio_with("demo");
        studio.upload_reference(&mut session, "logo.png", b"L".to_vec()).unwrap();
        let images = RecordingImages::default();

        let request = GenerationRequest::new("Launch day!").with_instructions("use teal");
        let generated = studio
            .generate(&mut session, &prompts(), &images, &request)
            .await
            .unwrap();

        assert!(generated.filename.starts_with("generated_"));
        assert!(generated.filename.ends_with(".png"));
        assert!(generated.prompt.starts_with("a bold poster for Launch day!"));
        assert!(generated.prompt.ends_with("use teal"));
        assert_eq!(*images.reference_counts.lock().unwrap(), vec![1]);
        assert_eq!(studio.current(&mut session).unwrap(), Some(generated.id));
        assert_eq!(
            studio.asset_content(&generated.id).unwrap(),
            format!("image:{}", generated.prompt).into_bytes()
        );
    }

    #[tokio::test]
    async fn blank_post_is_rejected() {
        let (studio, mut session) = studio_with("demo");
        let err = studio
            .generate(
                &mut session,
                &prompts(),
                &RecordingImages::default(),
                &GenerationRequest::new("  "),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn empty_prompt_stores_nothing() {
        let (studio, mut session) = studio_with("demo");
        let images = RecordingImages::default();
        let err = studio
            .generate(
                &mut session,
                &FixedPrompts { prompt: String::new() },
                &images,
                &GenerationRequest::new("post"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::EmptyPrompt));
        assert_eq!(images.calls.load(Ordering::SeqCst), 0);
        assert!(studio.list_assets(&project("demo"), Category::Generated).unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_stores_nothing() {
        let (studio, mut session) = studio_with("demo");
        let images = RecordingImages {
            fail_on_call: Some(1),
            ..Default::default()
        };
        let err = studio
            .generate(&mut session, &prompts(), &images, &GenerationRequest::new("post"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Upstream(UpstreamError::Request(_))));
        assert!(!err.is_retryable());
        assert!(studio.list_assets(&project("demo"), Category::Generated).unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_collaborator_times_out() {
        let mut config = StudioConfig::ephemeral();
        config.request_timeout_secs = 0;
        let studio = Studio::open(config).unwrap();
        studio.create_project(&project("demo")).unwrap();
        let mut session = studio.open_session(&project("demo")).unwrap();

        let err = studio
            .generate(&mut session, &prompts(), &SlowImages, &GenerationRequest::new("post"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Timeout { what: "image generation", .. }));
        assert!(err.is_retryable());
        assert!(studio.list_assets(&project("demo"), Category::Generated).unwrap().is_empty());
    }

    #[tokio::test]
    async fn series_returns_one_result_per_part() {
        let (studio, mut session) = studio_with("demo");
        let images = RecordingImages {
            fail_on_call: Some(2),
            ..Default::default()
        };

        let results = studio
            .generate_series(
                &mut session,
                &prompts(),
                &images,
                &GenerationRequest::new("post"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(StudioError::Upstream(_))));
        assert!(results[2].is_ok());
        assert_eq!(studio.list_assets(&project("demo"), Category::Generated).unwrap().len(), 2);

        let zero = studio
            .generate_series(
                &mut session,
                &prompts(),
                &images,
                &GenerationRequest::new("post"),
                Some(0),
            )
            .await;
        assert!(matches!(zero, Err(StudioError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn edit_uses_current_selection() {
        let (studio, mut session) = studio_with("demo");
        let images = RecordingImages::default();

        let none = studio.edit(&mut session, &images, "brighter").await.unwrap_err();
        assert!(matches!(none, StudioError::NoSelection(_)));

        let original = studio
            .import_for_edit(&mut session, "mine.png", b"pixels".to_vec())
            .unwrap();
        let edited = studio.edit(&mut session, &images, "brighter").await.unwrap();

        assert_ne!(edited.id, original);
        assert!(edited.filename.starts_with("edited_"));
        assert_eq!(studio.asset_content(&edited.id).unwrap(), b"pixels+brighter");
        assert_eq!(studio.current(&mut session).unwrap(), Some(edited.id));
        assert!(studio.asset_meta(&original).is_ok());
    }

    /// Store wrapper whose first `list` fails transiently.
    struct FlakyStore {
        inner: InMemoryBlobStore,
        failures_left: AtomicUsize,
    }

    impl BlobStore for FlakyStore {
        fn put(&self, asset: NewAsset) -> StoreResult<AssetId> {
            self.inner.put(asset)
        }
        fn list(&self, project: &ProjectName, category: Category) -> StoreResult<Vec<AssetMeta>> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::StorageUnavailable("blip".into()));
            }
            self.inner.list(project, category)
        }
        fn get(&self, id: &AssetId) -> StoreResult<Vec<u8>> {
            self.inner.get(id)
        }
        fn meta(&self, id: &AssetId) -> StoreResult<Option<AssetMeta>> {
            self.inner.meta(id)
        }
        fn find_by_digest(
            &self,
            project: &ProjectName,
            category: Category,
            digest: &bk_types::ContentDigest,
        ) -> StoreResult<Option<AssetId>> {
            self.inner.find_by_digest(project, category, digest)
        }
        fn delete(&self, id: &AssetId) -> StoreResult<bool> {
            self.inner.delete(id)
        }
        fn delete_all(&self, project: &ProjectName) -> StoreResult<usize> {
            self.inner.delete_all(project)
        }
    }

    fn flaky_studio(failures: usize, retry: bool) -> Studio {
        let mut config = StudioConfig::ephemeral();
        config.retry_transient_once = retry;
        Studio::with_backends(
            Arc::new(FlakyStore {
                inner: InMemoryBlobStore::new(),
                failures_left: AtomicUsize::new(failures),
            }),
            Arc::new(InMemoryProjectRegistry::new()),
            config,
        )
    }

    #[test]
    fn transient_read_is_retried_once() {
        assert!(flaky_studio(1, true).list_assets(&project("demo"), Category::Generated).is_ok());

        let err = flaky_studio(2, true)
            .list_assets(&project("demo"), Category::Generated)
            .unwrap_err();
        assert!(err.is_retryable());

        assert!(flaky_studio(1, false)
            .list_assets(&project("demo"), Category::Generated)
            .is_err());
    }
}
