//! Value types shared by several record kinds.

use super::Handle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gender of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Female.
    Female,
    /// Male.
    Male,
    /// Not recorded.
    #[default]
    Unknown,
}

impl Gender {
    /// Maps the integer codes used by schema version 1.
    #[must_use]
    pub const fn from_legacy_code(code: i64) -> Self {
        match code {
            0 => Gender::Female,
            1 => Gender::Male,
            _ => Gender::Unknown,
        }
    }

    /// Textual form, as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Unknown => "unknown",
        }
    }
}

/// One surname of a name. A name may carry several (e.g. patronymic and
/// family name).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Surname {
    /// The surname itself.
    pub surname: String,
    /// Prefix such as "van" or "de".
    pub prefix: String,
    /// Whether this is the surname used for grouping and sorting.
    pub primary: bool,
}

impl Surname {
    /// A primary surname with no prefix.
    pub fn new(surname: impl Into<String>) -> Self {
        Self {
            surname: surname.into(),
            prefix: String::new(),
            primary: true,
        }
    }
}

/// A person's name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Name {
    /// Given names.
    pub first_name: String,
    /// Surnames, in display order.
    pub surname_list: Vec<Surname>,
    /// Suffix such as "Jr.".
    pub suffix: String,
    /// Title such as "Dr.".
    pub title: String,
    /// Privacy flag.
    pub private: bool,
}

impl Name {
    /// A name with one primary surname.
    pub fn new(first_name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            surname_list: vec![Surname::new(surname)],
            ..Self::default()
        }
    }

    /// The primary surname, or the first one when none is flagged.
    #[must_use]
    pub fn primary_surname(&self) -> Option<&Surname> {
        self.surname_list
            .iter()
            .find(|s| s.primary)
            .or_else(|| self.surname_list.first())
    }

    /// Surname text of [`Name::primary_surname`], empty when there is none.
    #[must_use]
    pub fn surname(&self) -> &str {
        self.primary_surname().map_or("", |s| s.surname.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.surname(), self.first_name)
    }
}

/// Qualifier of a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateModifier {
    /// Exact date.
    #[default]
    None,
    /// Before the date.
    Before,
    /// After the date.
    After,
    /// Approximately the date.
    About,
}

/// A calendar date. Zero month or day means "not known".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Date {
    /// Qualifier.
    pub modifier: DateModifier,
    /// Year, zero when unknown.
    pub year: i32,
    /// Month 1-12, zero when unknown.
    pub month: u8,
    /// Day 1-31, zero when unknown.
    pub day: u8,
}

impl Date {
    /// An exact date.
    #[must_use]
    pub const fn ymd(year: i32, month: u8, day: u8) -> Self {
        Self {
            modifier: DateModifier::None,
            year,
            month,
            day,
        }
    }

    /// A date with only the year known.
    #[must_use]
    pub const fn year(year: i32) -> Self {
        Self::ymd(year, 0, 0)
    }

    /// Sets the modifier.
    #[must_use]
    pub const fn with_modifier(mut self, modifier: DateModifier) -> Self {
        self.modifier = modifier;
        self
    }

    /// Integer key that orders dates chronologically.
    #[must_use]
    pub fn sort_value(&self) -> i64 {
        i64::from(self.year) * 10_000 + i64::from(self.month) * 100 + i64::from(self.day)
    }

    /// True when no component is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            DateModifier::None => {}
            DateModifier::Before => f.write_str("before ")?,
            DateModifier::After => f.write_str("after ")?,
            DateModifier::About => f.write_str("about ")?,
        }
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Role a person or family plays in an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventRole {
    /// The main participant.
    #[default]
    Primary,
    /// The family as a whole.
    Family,
    /// A witness.
    Witness,
    /// Anything else.
    Custom(String),
}

/// Reference from a person or family to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    /// The event.
    pub handle: Handle,
    /// Role played in the event.
    #[serde(default)]
    pub role: EventRole,
    /// Privacy flag.
    #[serde(default)]
    pub private: bool,
}

impl EventRef {
    /// A primary-role reference.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            role: EventRole::Primary,
            private: false,
        }
    }
}

/// Relation of a child to one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildRelation {
    /// Biological child.
    #[default]
    Birth,
    /// Adopted.
    Adopted,
    /// Stepchild.
    Stepchild,
    /// Foster child.
    Foster,
    /// Not recorded.
    Unknown,
}

/// Reference from a family to a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    /// The child.
    pub handle: Handle,
    /// Relation to the father.
    #[serde(default)]
    pub father_rel: ChildRelation,
    /// Relation to the mother.
    #[serde(default)]
    pub mother_rel: ChildRelation,
    /// Privacy flag.
    #[serde(default)]
    pub private: bool,
}

impl ChildRef {
    /// A birth child reference.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            father_rel: ChildRelation::Birth,
            mother_rel: ChildRelation::Birth,
            private: false,
        }
    }
}

/// Citation of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// The source.
    pub handle: Handle,
    /// Page or other location within the source.
    #[serde(default)]
    pub page: String,
    /// Privacy flag.
    #[serde(default)]
    pub private: bool,
}

impl SourceRef {
    /// Cites `page` of a source.
    pub fn new(handle: Handle, page: impl Into<String>) -> Self {
        Self {
            handle,
            page: page.into(),
            private: false,
        }
    }
}

/// Reference to a media object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// The media object.
    pub handle: Handle,
    /// Privacy flag.
    #[serde(default)]
    pub private: bool,
}

/// Reference from a source to the repository holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// The repository.
    pub handle: Handle,
    /// Call number within the repository.
    #[serde(default)]
    pub call_number: String,
    /// Medium, e.g. "book" or "microfilm".
    #[serde(default)]
    pub media_type: String,
    /// Privacy flag.
    #[serde(default)]
    pub private: bool,
}

/// Association between two people (godfather, friend, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    /// The associated person.
    pub handle: Handle,
    /// Description of the association.
    #[serde(default)]
    pub relation: String,
    /// Privacy flag.
    #[serde(default)]
    pub private: bool,
}

/// Free-form key/value attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    /// Attribute name.
    pub key: String,
    /// Attribute value.
    pub value: String,
    /// Privacy flag.
    pub private: bool,
}

impl Attribute {
    /// A public attribute.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            private: false,
        }
    }
}

/// Web address of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Url {
    /// The address.
    pub path: String,
    /// Description.
    pub description: String,
    /// Privacy flag.
    pub private: bool,
}

/// Anything that points at another record by handle.
pub(crate) trait Reference {
    fn target(&self) -> Handle;
    fn retarget(&mut self, handle: Handle);
    fn is_private(&self) -> bool {
        false
    }
}

impl Reference for Handle {
    fn target(&self) -> Handle {
        *self
    }

    fn retarget(&mut self, handle: Handle) {
        *self = handle;
    }
}

macro_rules! impl_reference {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reference for $ty {
                fn target(&self) -> Handle {
                    self.handle
                }

                fn retarget(&mut self, handle: Handle) {
                    self.handle = handle;
                }

                fn is_private(&self) -> bool {
                    self.private
                }
            }
        )*
    };
}

impl_reference!(EventRef, ChildRef, SourceRef, MediaRef, RepoRef, PersonRef);

/// Helpers that walk one reference list of a record.
pub(crate) mod refs {
    use super::Reference;
    use crate::model::Handle;
    use crate::types::EntityKind;

    pub(crate) type Keep<'a> = dyn FnMut(EntityKind, Handle) -> bool + 'a;

    pub(crate) fn collect<R: Reference>(
        out: &mut Vec<(EntityKind, Handle)>,
        kind: EntityKind,
        list: &[R],
    ) {
        out.extend(list.iter().map(|r| (kind, r.target())));
    }

    pub(crate) fn collect_opt(
        out: &mut Vec<(EntityKind, Handle)>,
        kind: EntityKind,
        handle: Option<Handle>,
    ) {
        out.extend(handle.map(|h| (kind, h)));
    }

    pub(crate) fn retain<R: Reference>(list: &mut Vec<R>, kind: EntityKind, keep: &mut Keep<'_>) {
        list.retain(|r| keep(kind, r.target()));
    }

    pub(crate) fn retain_opt(handle: &mut Option<Handle>, kind: EntityKind, keep: &mut Keep<'_>) {
        if let Some(h) = *handle {
            if !keep(kind, h) {
                *handle = None;
            }
        }
    }

    pub(crate) fn replace<R: Reference>(
        list: &mut [R],
        kind: EntityKind,
        target: EntityKind,
        old: Handle,
        new: Handle,
    ) {
        if kind != target {
            return;
        }
        for r in list.iter_mut().filter(|r| r.target() == old) {
            r.retarget(new);
        }
    }

    pub(crate) fn replace_opt(
        handle: &mut Option<Handle>,
        kind: EntityKind,
        target: EntityKind,
        old: Handle,
        new: Handle,
    ) {
        if kind == target && *handle == Some(old) {
            *handle = Some(new);
        }
    }

    pub(crate) fn strip_private<R: Reference>(list: &mut Vec<R>) {
        list.retain(|r| !r.is_private());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;

    #[test]
    fn primary_surname_prefers_flag() {
        let mut name = Name::new("Anna", "Smith");
        name.surname_list[0].primary = false;
        name.surname_list.push(Surname::new("Jones"));
        assert_eq!(name.surname(), "Jones");
    }

    #[test]
    fn primary_surname_falls_back_to_first() {
        let mut name = Name::new("Anna", "Smith");
        name.surname_list[0].primary = false;
        assert_eq!(name.surname(), "Smith");
        assert_eq!(Name::default().surname(), "");
    }

    #[test]
    fn date_ordering() {
        let a = Date::ymd(1850, 3, 1);
        let b = Date::year(1851);
        assert!(a.sort_value() < b.sort_value());
        assert_eq!(b.to_string(), "1851-00-00");
        assert_eq!(
            Date::year(1900).with_modifier(DateModifier::About).to_string(),
            "about 1900-00-00"
        );
    }

    #[test]
    fn legacy_gender_codes() {
        assert_eq!(Gender::from_legacy_code(0), Gender::Female);
        assert_eq!(Gender::from_legacy_code(1), Gender::Male);
        assert_eq!(Gender::from_legacy_code(2), Gender::Unknown);
        assert_eq!(Gender::from_legacy_code(7), Gender::Unknown);
    }

    #[test]
    fn replace_only_touches_matching_kind() {
        let old = Handle::new();
        let new = Handle::new();
        let mut list = vec![old];
        refs::replace(&mut list, EntityKind::Note, EntityKind::Event, old, new);
        assert_eq!(list, vec![old]);
        refs::replace(&mut list, EntityKind::Note, EntityKind::Note, old, new);
        assert_eq!(list, vec![new]);
    }
}
