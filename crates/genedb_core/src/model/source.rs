//! Source and repository records.

use super::common::refs;
use super::record::record_fields;
use super::{AnyRecord, Handle, MediaRef, Record, RepoRef, Url};
use crate::store::{RecordStore, Tables};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};

/// A document the research draws on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    /// Handle, assigned on add.
    pub handle: Option<Handle>,
    /// Public id.
    pub gramps_id: String,
    /// Last change stamp.
    pub change: i64,
    /// Privacy flag.
    pub private: bool,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Publication information.
    pub pubinfo: String,
    /// Abbreviation used in citations.
    pub abbrev: String,
    /// Repositories holding the source.
    pub reporef_list: Vec<RepoRef>,
    /// Media.
    pub media_list: Vec<MediaRef>,
    /// Notes.
    pub note_list: Vec<Handle>,
}

impl Source {
    /// A source with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Record for Source {
    const KIND: EntityKind = EntityKind::Source;

    record_fields!();

    fn references(&self) -> Vec<(EntityKind, Handle)> {
        let mut out = Vec::new();
        refs::collect(&mut out, EntityKind::Repository, &self.reporef_list);
        refs::collect(&mut out, EntityKind::Media, &self.media_list);
        refs::collect(&mut out, EntityKind::Note, &self.note_list);
        out
    }

    fn retain_references(&mut self, keep: &mut dyn FnMut(EntityKind, Handle) -> bool) {
        refs::retain(&mut self.reporef_list, EntityKind::Repository, keep);
        refs::retain(&mut self.media_list, EntityKind::Media, keep);
        refs::retain(&mut self.note_list, EntityKind::Note, keep);
    }

    fn replace_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) {
        refs::replace(&mut self.reporef_list, kind, EntityKind::Repository, old, new);
        refs::replace(&mut self.media_list, kind, EntityKind::Media, old, new);
        refs::replace(&mut self.note_list, kind, EntityKind::Note, old, new);
    }

    fn sanitize_private(&mut self) {
        refs::strip_private(&mut self.reporef_list);
        refs::strip_private(&mut self.media_list);
    }

    fn sort_key(&self) -> String {
        self.title.to_lowercase()
    }

    fn table(tables: &Tables) -> &RecordStore<Self> {
        &tables.source
    }

    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self> {
        &mut tables.source
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Source(self)
    }
}

/// Kind of repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryType {
    /// Library.
    Library,
    /// Archive.
    Archive,
    /// Church.
    Church,
    /// Cemetery.
    Cemetery,
    /// Web site.
    WebSite,
    /// Private collection.
    Collection,
    /// Not recorded.
    #[default]
    Unknown,
}

/// Where sources are kept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    /// Handle, assigned on add.
    pub handle: Option<Handle>,
    /// Public id.
    pub gramps_id: String,
    /// Last change stamp.
    pub change: i64,
    /// Privacy flag.
    pub private: bool,
    /// Name.
    pub name: String,
    /// Type.
    pub repo_type: RepositoryType,
    /// Web addresses.
    pub urls: Vec<Url>,
    /// Notes.
    pub note_list: Vec<Handle>,
}

impl Repository {
    /// A repository with the given name.
    pub fn new(name: impl Into<String>, repo_type: RepositoryType) -> Self {
        Self {
            name: name.into(),
            repo_type,
            ..Self::default()
        }
    }
}

impl Record for Repository {
    const KIND: EntityKind = EntityKind::Repository;

    record_fields!();

    fn references(&self) -> Vec<(EntityKind, Handle)> {
        let mut out = Vec::new();
        refs::collect(&mut out, EntityKind::Note, &self.note_list);
        out
    }

    fn retain_references(&mut self, keep: &mut dyn FnMut(EntityKind, Handle) -> bool) {
        refs::retain(&mut self.note_list, EntityKind::Note, keep);
    }

    fn replace_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) {
        refs::replace(&mut self.note_list, kind, EntityKind::Note, old, new);
    }

    fn sanitize_private(&mut self) {
        self.urls.retain(|u| !u.private);
    }

    fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }

    fn table(tables: &Tables) -> &RecordStore<Self> {
        &tables.repository
    }

    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self> {
        &mut tables.repository
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Repository(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_points_at_repositories() {
        let repo = Handle::new();
        let mut src = Source::new("Parish register");
        src.reporef_list.push(RepoRef {
            handle: repo,
            call_number: "PR-12".into(),
            media_type: "book".into(),
            private: false,
        });
        assert!(src.refers_to(EntityKind::Repository, repo));
        src.remove_references(EntityKind::Repository, &[repo]);
        assert!(src.references().is_empty());
    }

    #[test]
    fn private_urls_are_stripped() {
        let mut repo = Repository::new("County archive", RepositoryType::Archive);
        repo.urls.push(Url {
            path: "https://example.org".into(),
            description: String::new(),
            private: true,
        });
        repo.sanitize_private();
        assert!(repo.urls.is_empty());
    }
}
