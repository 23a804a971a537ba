//! Per-element display information
//!
//! [`ElementInfo`] is everything a folder list needs to render one
//! element. [`ElementDescriptor`] is its compact form sent to the
//! browser, and [`MailboxResponse`] wraps a drained diff in that form.

use crate::element::{BASE_ELT, MailboxElement};
use crate::folder::SpecialFolder;
use crate::lister::MailboxStatus;
use crate::search::SearchKind;
use crate::tree::MailboxTree;
use serde::{Deserialize, Serialize};
use tracing::debug;

const FOLDER_ICON: &str = "folders/folder.png";
const OPEN_ICON: &str = "folders/open.png";

/// Extended information about a tree element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub value: String,
    pub label: String,
    pub parent: String,
    pub level: usize,
    /// Has children in the current view.
    pub children: bool,
    pub container: bool,
    pub nonimap: bool,
    pub subscribed: bool,
    /// Polled, and the STATUS lookup succeeded.
    pub polled: bool,
    pub status: Option<MailboxStatus>,
    pub special: Option<SpecialFolder>,
    /// A built-in virtual folder with its own styling.
    pub special_vfolder: bool,
    pub vfolder: bool,
    pub editable_vfolder: bool,
    pub icon: String,
    pub icon_dir: String,
    /// Icon to switch to when a container is opened.
    pub icon_open: Option<String>,
    pub alt: String,
    pub class: String,
    /// The icon comes from the site's per-mailbox configuration.
    pub user_icon: bool,
}

impl MailboxTree {
    /// Display information for `value`.
    #[must_use]
    pub fn element(&self, value: &str) -> Option<ElementInfo> {
        self.get(value).map(|elt| self.element_info(elt, false))
    }

    /// Display information for `elt`. With `force_open`, containers get
    /// distinct icons for their open and closed state.
    pub(crate) fn element_info(&self, elt: &MailboxElement, force_open: bool) -> ElementInfo {
        let show_unsub = self.showing_unsubscribed();
        let open = self.is_open_in(elt, show_unsub);

        let mut info = ElementInfo {
            value: elt.value.clone(),
            label: elt.label.clone(),
            parent: elt.parent.clone(),
            level: elt.depth,
            children: self.has_children_in(&elt.value, show_unsub),
            container: false,
            nonimap: elt.is_nonimap(),
            subscribed: elt.is_subscribed(),
            polled: false,
            status: None,
            special: None,
            special_vfolder: false,
            vfolder: elt.is_vfolder(),
            editable_vfolder: false,
            icon: FOLDER_ICON.to_string(),
            icon_dir: self.config().image_dir.clone(),
            icon_open: None,
            alt: String::new(),
            class: String::new(),
            user_icon: false,
        };

        if self.is_container_in(elt, show_unsub) {
            info.container = true;
            if force_open && open {
                info.icon = OPEN_ICON.to_string();
                info.alt = "Opened Folder".to_string();
                info.class = "folderopenImg".to_string();
            } else {
                info.icon_open = Some(OPEN_ICON.to_string());
                info.alt = if force_open { "Closed Folder" } else { "Folder" }.to_string();
                info.class = "folderImg".to_string();
            }
        } else {
            if self.is_polled(&elt.value) {
                match self.lister().status(&elt.value) {
                    Ok(status) => {
                        info.polled = true;
                        info.status = Some(status);
                    }
                    Err(e) => debug!("No status for {}: {}", elt.value, e),
                }
            }

            info.special = self.special_mailboxes().classify(&elt.value);
            if let Some(special) = info.special {
                info.icon = special.icon().to_string();
                info.alt = special.alt().to_string();
                info.class = special.css_class().to_string();
            } else {
                info.icon = if open { OPEN_ICON } else { FOLDER_ICON }.to_string();
                info.class = if open { "folderopenImg" } else { "folderImg" }.to_string();
                info.alt = "Mailbox".to_string();
            }

            if info.vfolder {
                self.style_vfolder(&mut info);
            }
        }

        if let Some(custom) = self.config().icons.get(&elt.value) {
            info.icon.clone_from(&custom.icon);
            if let Some(dir) = &custom.icon_dir {
                info.icon_dir.clone_from(dir);
            }
            if let Some(alt) = custom.alt.as_ref().filter(|alt| !alt.is_empty()) {
                info.alt.clone_from(alt);
            }
            info.icon_open.clone_from(&custom.icon_open);
            info.user_icon = true;
        }

        info
    }

    fn style_vfolder(&self, info: &mut ElementInfo) {
        let Some(search) = self
            .vfolder_id(&info.value)
            .and_then(|id| self.searches().get(id))
        else {
            return;
        };

        info.editable_vfolder = search.editable;
        let (special, alt) = match search.kind {
            SearchKind::VirtualTrash => (SpecialFolder::Trash, "Virtual Trash Folder"),
            SearchKind::VirtualInbox => (SpecialFolder::Inbox, "Virtual INBOX Folder"),
            SearchKind::User => return,
        };
        info.special_vfolder = true;
        info.icon = special.icon().to_string();
        info.alt = alt.to_string();
        info.class = special.css_class().to_string();
    }

    /// The pending diff in browser form; `None` when nothing changed.
    ///
    /// Ends diff tracking.
    pub fn mailbox_response(&mut self) -> Option<MailboxResponse> {
        let diff = self.take_diff()?;

        let describe = |value: &String| {
            self.element(value)
                .map(|info| ElementDescriptor::from_info(&info))
        };

        Some(MailboxResponse {
            added: diff.added.iter().filter_map(describe).collect(),
            changed: diff
                .changed
                .iter()
                .filter(|value| value.as_str() != BASE_ELT)
                .filter_map(describe)
                .collect(),
            deleted: self.deepest_first(diff.deleted.into_iter().collect()),
        })
    }

    /// Order deleted values so children come before their ancestors.
    fn deepest_first(&self, mut values: Vec<String>) -> Vec<String> {
        let depth = |value: &String| {
            let delim = self
                .namespaces()
                .delimiter(value)
                .unwrap_or_else(|| self.delimiter());
            if delim.is_empty() {
                0
            } else {
                value.matches(delim).count()
            }
        };
        values.sort_by_key(|value| std::cmp::Reverse(depth(value)));
        values
    }
}

/// Virtual folder kind as reported to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum VFolderKind {
    #[default]
    None,
    System,
    User,
}

impl From<VFolderKind> for u8 {
    fn from(kind: VFolderKind) -> Self {
        match kind {
            VFolderKind::None => 0,
            VFolderKind::System => 1,
            VFolderKind::User => 2,
        }
    }
}

impl From<u8> for VFolderKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::System,
            2 => Self::User,
            _ => Self::None,
        }
    }
}

/// Compact element description consumed by the folder sidebar.
///
/// Fields at their default value are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    #[serde(rename = "ch", default, skip_serializing_if = "is_false")]
    pub children: bool,
    #[serde(rename = "cl")]
    pub class: String,
    #[serde(rename = "co", default, skip_serializing_if = "is_false")]
    pub container: bool,
    /// Full path of a user-defined icon.
    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Display label, when it differs from the mailbox value.
    #[serde(rename = "l", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "m")]
    pub mailbox: String,
    #[serde(rename = "n", default, skip_serializing_if = "is_false")]
    pub nonimap: bool,
    #[serde(rename = "pa", default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "po", default, skip_serializing_if = "is_false")]
    pub polled: bool,
    #[serde(rename = "s", default, skip_serializing_if = "is_false")]
    pub special: bool,
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub unseen: Option<u32>,
    #[serde(rename = "un", default, skip_serializing_if = "is_false")]
    pub unsubscribed: bool,
    #[serde(rename = "v", default, skip_serializing_if = "is_plain")]
    pub vfolder: VFolderKind,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_plain(kind: &VFolderKind) -> bool {
    matches!(kind, VFolderKind::None)
}

impl ElementDescriptor {
    #[must_use]
    pub fn from_info(info: &ElementInfo) -> Self {
        let mut desc = Self {
            children: info.children,
            class: info.class.clone(),
            label: (info.label != info.value).then(|| info.label.clone()),
            mailbox: info.value.clone(),
            parent: (info.parent != BASE_ELT).then(|| info.parent.clone()),
            polled: info.polled,
            unsubscribed: !info.subscribed,
            ..Self::default()
        };

        if info.vfolder {
            desc.vfolder = if info.editable_vfolder {
                VFolderKind::User
            } else {
                VFolderKind::System
            };
        }

        if info.container {
            desc.class = "exp".to_string();
            desc.container = true;
            desc.nonimap = info.nonimap;
        } else {
            if info.polled {
                desc.unseen = Some(info.status.map_or(0, |s| s.unseen));
            }
            if info.special.is_some() {
                desc.special = true;
            } else if !info.vfolder && info.children {
                desc.class = "exp".to_string();
            }
        }

        if info.user_icon {
            desc.class = "customimg".to_string();
            desc.icon = Some(if info.icon_dir.is_empty() {
                info.icon.clone()
            } else {
                format!("{}/{}", info.icon_dir, info.icon)
            });
        }

        desc
    }
}

/// Tree changes in browser form.
///
/// Serialized with the short keys `a` (added), `c` (changed) and `d`
/// (deleted); empty lists are omitted. `deleted` lists children before
/// their ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxResponse {
    #[serde(rename = "a", default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<ElementDescriptor>,
    #[serde(rename = "c", default, skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<ElementDescriptor>,
    #[serde(rename = "d", default, skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
}
