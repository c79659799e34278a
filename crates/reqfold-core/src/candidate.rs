use std::fmt;
use std::sync::Arc;

use crate::link::Link;
use crate::requirement::Requirement;
use crate::specifier::SpecifierSet;
use crate::version::Version;

/// One concrete installable artifact known to an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub version: Version,
    pub link: Option<Link>,
    pub editable: bool,
}

impl Candidate {
    pub fn new(name: impl Into<String>, version: Version, link: Option<Link>) -> Self {
        Self {
            name: name.into(),
            version,
            link,
            editable: false,
        }
    }

    pub fn is_wheel(&self) -> bool {
        self.link.as_ref().is_some_and(Link::is_wheel)
    }

    /// Materialise this candidate as a pinned requirement. Extras, markers and
    /// the constraint flag come from `template` (the range it was selected
    /// for); `parent` records who declared it.
    pub fn to_requirement(&self, template: &Requirement, parent: Option<Arc<Requirement>>) -> Requirement {
        let base = if self.editable {
            match &self.link {
                Some(link) => Requirement::editable(self.name.clone(), link.clone()),
                None => Requirement::pinned(self.name.clone(), &self.version),
            }
        } else {
            Requirement::new(self.name.clone(), SpecifierSet::pinned(&self.version))
                .with_link(self.link.clone())
        };
        base.with_extras(template.extras().iter().cloned())
            .with_markers(template.markers().cloned())
            .with_constraint(template.is_constraint())
            .with_parent(parent)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)?;
        if let Some(link) = &self.link {
            write!(f, " ({})", link.filename())?;
        }
        Ok(())
    }
}
