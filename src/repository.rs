//! Tour discovery and persistence.
//!
//! Tours are discovered per workspace root from two sources:
//!
//! ```text
//! <root>/.tour                  # main tour, standard location
//! <root>/.codewalk/main.tour    # main tour, fallback location
//! <root>/.codewalk/tours/**     # sub tours, current directory
//! <root>/.tours/**              # sub tours, legacy directory
//! ```
//!
//! Only one main tour exists per root: the first candidate that reads and
//! parses wins. A file that fails to read or parse contributes nothing and
//! discovery continues. Each tour's id is the canonical path of its source
//! file — the only identity that survives re-discovery.

use std::{fs, io, path::Path, path::PathBuf};

use ignore::WalkBuilder;

use crate::git::GitLookup;
use crate::model::{SharedTour, Tour, shared};
use crate::resolver::{self, Locator};

/// Candidate paths for the single main tour, in priority order.
pub const MAIN_TOUR_FILES: [&str; 2] = [".tour", ".codewalk/main.tour"];

/// Directories searched recursively for sub tours: current, then legacy.
pub const TOUR_DIRECTORIES: [&str; 2] = [".codewalk/tours", ".tours"];

/// File extensions that may hold a tour.
pub const TOUR_EXTENSIONS: [&str; 2] = ["tour", "json"];

const TOUR_SCHEMA: &str = "https://codewalk.dev/schema/tour.json";

/// Errors from reading or writing tour files.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("a tour titled \"{0}\" already exists in this workspace")]
    TourExists(String),
}

pub type Result<T> = core::result::Result<T, RepositoryError>;

/// Owns the canonical, title-ordered tour collection.
pub struct TourRepository {
    roots: Vec<PathBuf>,
    tours: Vec<SharedTour>,
}

impl TourRepository {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            tours: Vec::new(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn tours(&self) -> &[SharedTour] {
        &self.tours
    }

    pub fn has_tours(&self) -> bool {
        !self.tours.is_empty()
    }

    /// Reads every discovery source and returns a fresh collection, sorted
    /// by title (case-insensitive). Does not touch the published
    /// collection — the engine commits the swap atomically.
    pub fn discover(&self) -> Vec<SharedTour> {
        let mut tours = Vec::new();

        for root in &self.roots {
            if let Some(main) = discover_main_tour(root) {
                tours.push(main);
            }
            discover_sub_tours(root, &mut tours);
        }

        tours.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        tours.into_iter().map(shared).collect()
    }

    /// Publishes a freshly discovered collection as a whole.
    pub fn commit(&mut self, fresh: Vec<SharedTour>) {
        self.tours = fresh;
    }

    pub fn find(&self, id: &str) -> Option<SharedTour> {
        self.tours
            .iter()
            .find(|tour| tour.borrow().id == id)
            .cloned()
    }

    /// Finds a tour by its raw or display title.
    pub fn find_by_title(&self, title: &str) -> Option<SharedTour> {
        self.tours
            .iter()
            .find(|tour| {
                let tour = tour.borrow();
                tour.title == title || tour.display_title() == title
            })
            .cloned()
    }

    /// The tour flagged primary, if any.
    pub fn primary(&self) -> Option<SharedTour> {
        self.tours
            .iter()
            .find(|tour| tour.borrow().is_primary())
            .cloned()
    }

    /// The workspace root a tour's relative paths resolve against: the
    /// root containing its source file, else the first root.
    pub fn workspace_root_for(&self, tour: &Tour) -> Option<PathBuf> {
        self.roots
            .iter()
            .find(|root| {
                Path::new(&tour.id).starts_with(canonicalized(root))
            })
            .or_else(|| self.roots.first())
            .cloned()
    }

    /// Writes a tour back to its source file.
    ///
    /// The persisted form carries a `$schema` field and drops `id` and
    /// every step's derived `markerTitle`.
    pub fn save(&self, tour: &Tour) -> Result<()> {
        let mut persisted = tour.clone();
        persisted.schema = Some(TOUR_SCHEMA.to_string());

        let json = serde_json::to_string_pretty(&persisted)?;
        fs::write(&tour.id, json)?;
        Ok(())
    }

    /// Creates a new, empty tour file under the workspace's tour directory
    /// and returns the loaded tour.
    pub fn create(
        &self,
        workspace_root: &Path,
        title: &str,
        git_ref: Option<&str>,
    ) -> Result<SharedTour> {
        let path = tour_file_path(workspace_root, title);
        if path.exists() {
            return Err(RepositoryError::TourExists(title.to_string()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tour = Tour::new(title);
        // "HEAD" means "not pinned" and is never persisted.
        tour.git_ref = git_ref.filter(|r| *r != "HEAD").map(String::from);

        let json = serde_json::to_string_pretty(&tour)?;
        fs::write(&path, json)?;

        tour.id = canonical_id(&path);
        Ok(shared(tour))
    }

    /// Deletes a tour's backing file.
    pub fn delete(&self, tour_id: &str) -> Result<()> {
        fs::remove_file(tour_id)?;
        Ok(())
    }
}

/// Serializes a tour for sharing outside the workspace.
///
/// Every file step's current content — ref-pinned when the tour has a ref —
/// is embedded inline, so the export is self-contained. The identity and
/// the ref are dropped.
pub fn export_tour(
    tour: &Tour,
    workspace_root: Option<&Path>,
    git: &dyn GitLookup,
) -> Result<String> {
    let mut exported = tour.clone();
    exported.id = String::new();
    exported.git_ref = None;
    exported.schema = None;

    for step in &mut exported.steps {
        step.marker_title = None;
        if step.contents.is_some() || step.uri.is_some() || step.file.is_none() {
            continue;
        }

        let locator = resolver::resolve(step, workspace_root, tour.git_ref.as_deref(), git)
            .unwrap_or(Locator::Placeholder);
        let contents = match &locator {
            Locator::Document { path } => fs::read_to_string(path)?,
            Locator::GitObject { path, git_ref } => {
                let file = step.file.as_deref().unwrap_or_default();
                match git.file_at_ref(file, git_ref) {
                    Some(contents) => contents,
                    // Ref content unavailable: degrade to the working copy.
                    None => fs::read_to_string(path)?,
                }
            }
            _ => continue,
        };
        step.contents = Some(contents);
    }

    Ok(serde_json::to_string_pretty(&exported)?)
}

/// The file a newly recorded tour is written to.
pub fn tour_file_path(workspace_root: &Path, title: &str) -> PathBuf {
    let file: String = title
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    workspace_root
        .join(TOUR_DIRECTORIES[0])
        .join(format!("{file}.tour"))
}

fn discover_main_tour(root: &Path) -> Option<Tour> {
    MAIN_TOUR_FILES
        .iter()
        .find_map(|candidate| read_tour_file(&root.join(candidate)))
}

fn discover_sub_tours(root: &Path, tours: &mut Vec<Tour>) {
    for directory in TOUR_DIRECTORIES {
        let directory = root.join(directory);
        if !directory.is_dir() {
            continue;
        }

        // Tour directories live under dot-directories, so the usual hidden
        // and gitignore filtering must be off.
        let walker = WalkBuilder::new(&directory)
            .standard_filters(false)
            .sort_by_file_name(Ord::cmp)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let has_tour_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| TOUR_EXTENSIONS.contains(&ext));
            if !has_tour_extension {
                continue;
            }
            if let Some(tour) = read_tour_file(path) {
                tours.push(tour);
            }
        }
    }
}

/// Reads and parses one tour file. Any failure drops the file from
/// discovery without failing discovery itself.
fn read_tour_file(path: &Path) -> Option<Tour> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping unreadable tour file");
            return None;
        }
    };

    match serde_json::from_str::<Tour>(&contents) {
        Ok(mut tour) => {
            tour.id = canonical_id(path);
            Some(tour)
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping malformed tour file");
            None
        }
    }
}

fn canonical_id(path: &Path) -> String {
    canonicalized(path).to_string_lossy().into_owned()
}

fn canonicalized(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::git::NoGit;
    use crate::model::Step;

    fn write_tour(path: &Path, title: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let json = format!(r#"{{ "title": "{title}", "steps": [] }}"#);
        fs::write(path, json).unwrap();
    }

    fn repository(dir: &TempDir) -> TourRepository {
        TourRepository::new(vec![dir.path().to_path_buf()])
    }

    #[test]
    fn first_main_tour_candidate_wins() {
        let dir = TempDir::new().unwrap();
        write_tour(&dir.path().join(".tour"), "Standard main");
        write_tour(&dir.path().join(".codewalk/main.tour"), "Fallback main");

        let tours = repository(&dir).discover();
        let titles: Vec<String> = tours.iter().map(|t| t.borrow().title.clone()).collect();
        assert_eq!(titles, vec!["Standard main"]);
    }

    #[test]
    fn fallback_main_tour_is_used_when_standard_is_absent() {
        let dir = TempDir::new().unwrap();
        write_tour(&dir.path().join(".codewalk/main.tour"), "Fallback main");

        let tours = repository(&dir).discover();
        assert_eq!(tours.len(), 1);
        assert_eq!(tours[0].borrow().title, "Fallback main");
    }

    #[test]
    fn sub_tours_are_discovered_recursively_from_both_directories() {
        let dir = TempDir::new().unwrap();
        write_tour(&dir.path().join(".codewalk/tours/a.tour"), "Alpha");
        write_tour(&dir.path().join(".codewalk/tours/nested/b.json"), "Beta");
        write_tour(&dir.path().join(".tours/c.tour"), "Gamma");

        // Wrong extension: never read.
        write_tour(&dir.path().join(".codewalk/tours/notes.txt"), "Notes");

        let tours = repository(&dir).discover();
        let titles: Vec<String> = tours.iter().map(|t| t.borrow().title.clone()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn malformed_files_are_dropped_and_discovery_continues() {
        let dir = TempDir::new().unwrap();
        write_tour(&dir.path().join(".codewalk/tours/good.tour"), "Good");
        fs::write(dir.path().join(".codewalk/tours/bad.tour"), "{ nope").unwrap();

        let tours = repository(&dir).discover();
        assert_eq!(tours.len(), 1);
        assert_eq!(tours[0].borrow().title, "Good");
    }

    #[test]
    fn collection_is_sorted_case_insensitively() {
        let dir = TempDir::new().unwrap();
        write_tour(&dir.path().join(".codewalk/tours/1.tour"), "beta");
        write_tour(&dir.path().join(".codewalk/tours/2.tour"), "Alpha");
        write_tour(&dir.path().join(".codewalk/tours/3.tour"), "GAMMA");

        let tours = repository(&dir).discover();
        let titles: Vec<String> = tours.iter().map(|t| t.borrow().title.clone()).collect();
        assert_eq!(titles, vec!["Alpha", "beta", "GAMMA"]);
    }

    #[test]
    fn id_is_the_canonical_source_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".codewalk/tours/a.tour");
        write_tour(&path, "Alpha");

        let tours = repository(&dir).discover();
        let id = tours[0].borrow().id.clone();
        assert_eq!(id, fs::canonicalize(&path).unwrap().to_string_lossy());
    }

    #[test]
    fn save_strips_identity_and_adds_schema() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let tour = repo
            .create(dir.path(), "My Walk", Some("HEAD"))
            .unwrap();

        tour.borrow_mut().steps.push(Step {
            marker_title: Some("derived".into()),
            ..Step::file("src/main.rs", "The entry point")
        });
        repo.save(&tour.borrow()).unwrap();

        let raw = fs::read_to_string(&tour.borrow().id).unwrap();
        assert!(raw.contains("$schema"));
        assert!(!raw.contains("\"id\""));
        assert!(!raw.contains("markerTitle"));
        // "HEAD" is the not-pinned sentinel; it is never written.
        assert!(!raw.contains("\"ref\""));

        let reloaded = repo.discover();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].borrow().title, "My Walk");
        assert_eq!(reloaded[0].borrow().steps.len(), 1);
    }

    #[test]
    fn create_slugifies_the_title_and_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let tour = repo.create(dir.path(), "My First Walk!", None).unwrap();

        assert!(
            tour.borrow()
                .id
                .ends_with(".codewalk/tours/my-first-walk.tour")
        );

        let err = repo.create(dir.path(), "My First Walk!", None).unwrap_err();
        assert!(matches!(err, RepositoryError::TourExists(_)));
    }

    #[test]
    fn create_pins_a_real_ref() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let tour = repo.create(dir.path(), "Pinned", Some("v1.0")).unwrap();
        assert_eq!(tour.borrow().git_ref.as_deref(), Some("v1.0"));
    }

    #[test]
    fn delete_removes_the_backing_file() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let tour = repo.create(dir.path(), "Doomed", None).unwrap();
        let id = tour.borrow().id.clone();

        repo.delete(&id).unwrap();
        assert!(repo.discover().is_empty());
    }

    #[test]
    fn export_embeds_file_contents_and_drops_the_ref() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();

        let mut tour = Tour::new("Exported");
        tour.id = "/somewhere/exported.tour".into();
        tour.git_ref = Some("main".into());
        tour.steps.push(Step::file("src/main.rs", "The entry point"));
        tour.steps.push(Step::content("Already virtual"));

        let json = export_tour(&tour, Some(dir.path()), &NoGit).unwrap();
        let exported: Tour = serde_json::from_str(&json).unwrap();

        assert_eq!(
            exported.steps[0].contents.as_deref(),
            Some("fn main() {}\n")
        );
        assert_eq!(exported.steps[0].file.as_deref(), Some("src/main.rs"));
        assert_eq!(exported.git_ref, None);
        assert!(!json.contains("\"ref\""));
    }

    #[test]
    fn workspace_root_for_picks_the_containing_root() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        write_tour(&dir_b.path().join(".codewalk/tours/b.tour"), "In B");

        let repo = TourRepository::new(vec![
            dir_a.path().to_path_buf(),
            dir_b.path().to_path_buf(),
        ]);
        let tours = repo.discover();

        let root = repo.workspace_root_for(&tours[0].borrow()).unwrap();
        assert_eq!(root, dir_b.path());
    }
}
