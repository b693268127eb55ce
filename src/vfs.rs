// in-memory fs tree. nodes sit in an arena and point at each other by index,
// removed subtrees hand their slots back through a free list

use crate::error::VfsError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace};

pub const DEFAULT_HOME: &str = "/home/guest";
pub const OWNER: &str = "user";
pub const GROUP: &str = "users";

const FILE_MODE: &str = "-rw-r--r--";
const DIR_MODE: &str = "drwxr-xr-x";

fn failed(op: &str, err: &VfsError) {
    debug!(op, error = %err, "vfs mutation failed");
}

/// Stable handle to a node slot in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
enum Payload {
    File(String),
    Directory(HashMap<String, NodeId>),
}

#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    payload: Payload,
    created_at: DateTime<Local>,
    modified_at: DateTime<Local>,
    permissions: String,
    owner: String,
    group: String,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>, payload: Payload) -> Self {
        let now = Local::now();
        let permissions = match payload {
            Payload::File(_) => FILE_MODE,
            Payload::Directory(_) => DIR_MODE,
        };
        Self {
            name: name.to_string(),
            parent,
            payload,
            created_at: now,
            modified_at: now,
            permissions: permissions.to_string(),
            owner: OWNER.to_string(),
            group: GROUP.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        match self.payload {
            Payload::File(_) => NodeKind::File,
            Payload::Directory(_) => NodeKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.payload, Payload::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.payload, Payload::File(_))
    }

    pub fn content(&self) -> Option<&str> {
        match &self.payload {
            Payload::File(content) => Some(content),
            Payload::Directory(_) => None,
        }
    }

    pub fn size(&self) -> usize {
        self.content().map_or(0, str::len)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Local> {
        self.modified_at
    }

    pub fn permissions(&self) -> &str {
        &self.permissions
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    fn children(&self) -> Option<&HashMap<String, NodeId>> {
        match &self.payload {
            Payload::Directory(children) => Some(children),
            Payload::File(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub path: String,
    pub kind: NodeKind,
    pub size: usize,
    pub created_at: DateTime<Local>,
    pub modified_at: DateTime<Local>,
    pub permissions: String,
    pub owner: String,
    pub group: String,
}

/// Normalize a slash-separated path: empty and `.` segments are dropped and
/// `..` pops the last kept segment. Popping past the root stays at the root.
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

// "/a/b" -> ("/a", "b"); root has no parent
fn split_parent(abs: &str) -> Option<(&str, &str)> {
    if abs == "/" {
        return None;
    }
    let idx = abs.rfind('/')?;
    let parent = if idx == 0 { "/" } else { &abs[..idx] };
    Some((parent, &abs[idx + 1..]))
}

fn join(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

#[derive(Debug, Clone)]
pub struct Vfs {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
    cwd: String,
    home: String,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    pub fn new() -> Self {
        Self::with_home(DEFAULT_HOME)
    }

    /// Empty tree rooted at `/`. `home` is what `~` and the empty path
    /// resolve to; it doesn't have to exist yet.
    pub fn with_home(home: &str) -> Self {
        Self {
            nodes: vec![Some(Node::new("", None, Payload::Directory(HashMap::new())))],
            free: Vec::new(),
            root: NodeId(0),
            cwd: "/".to_string(),
            home: normalize_path(home),
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn slot(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)?.as_ref()
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)?.as_mut()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id)
    }

    pub fn resolve_path(&self, path: &str) -> String {
        let joined = if path.is_empty() || path == "~" {
            self.home.clone()
        } else if let Some(rest) = path.strip_prefix("~/") {
            format!("{}/{}", self.home, rest)
        } else if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{}/{}", self.cwd, path)
        };
        normalize_path(&joined)
    }

    // walk from root, path must already be normalized
    fn lookup(&self, abs: &str) -> Option<NodeId> {
        let mut id = self.root;
        for seg in abs.split('/').filter(|s| !s.is_empty()) {
            id = *self.slot(id)?.children()?.get(seg)?;
        }
        Some(id)
    }

    pub fn lookup_id(&self, path: &str) -> Option<NodeId> {
        self.lookup(&self.resolve_path(path))
    }

    pub fn get_node(&self, path: &str) -> Option<&Node> {
        self.slot(self.lookup_id(path)?)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lookup_id(path).is_some()
    }

    /// Absolute path of a node, rebuilt by following parent links.
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = self.slot(id)?;
        while let Some(parent) = current.parent {
            segments.push(current.name.as_str());
            current = self.slot(parent)?;
        }
        segments.reverse();
        Some(format!("/{}", segments.join("/")))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.slot(id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn parent_for<'p>(&self, abs: &'p str) -> Result<(NodeId, &'p str), VfsError> {
        let (parent, name) = split_parent(abs)
            .ok_or_else(|| VfsError::AlreadyExists(abs.to_string()))?;
        let id = self
            .lookup(parent)
            .ok_or_else(|| VfsError::NotFound(parent.to_string()))?;
        match self.slot(id) {
            Some(node) if node.is_dir() => Ok((id, name)),
            _ => Err(VfsError::NotADirectory(parent.to_string())),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                NodeId(idx)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn touch_id(&mut self, id: NodeId) {
        if let Some(node) = self.slot_mut(id) {
            node.modified_at = Local::now();
        }
    }

    // caller has already checked the name is free
    fn attach(&mut self, parent: NodeId, name: &str, payload: Payload) -> NodeId {
        let id = self.alloc(Node::new(name, Some(parent), payload));
        if let Some(Node { payload: Payload::Directory(children), .. }) = self.slot_mut(parent) {
            children.insert(name.to_string(), id);
        }
        self.touch_id(parent);
        id
    }

    fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.slot(parent)?.children()?.get(name).copied()
    }

    pub fn mkdir(&mut self, path: &str) -> Result<(), VfsError> {
        self.create_dir(path).inspect_err(|e| failed("mkdir", e))
    }

    fn create_dir(&mut self, path: &str) -> Result<(), VfsError> {
        let abs = self.resolve_path(path);
        let (parent, name) = self.parent_for(&abs)?;
        if self.child(parent, name).is_some() {
            return Err(VfsError::AlreadyExists(abs));
        }
        self.attach(parent, name, Payload::Directory(HashMap::new()));
        trace!(path = %abs, "mkdir");
        Ok(())
    }

    /// Creates every missing directory along `path`. Existing directories
    /// are fine; an existing file in the way is not.
    pub fn mkdir_all(&mut self, path: &str) -> Result<(), VfsError> {
        self.create_dir_all(path).inspect_err(|e| failed("mkdir_all", e))
    }

    fn create_dir_all(&mut self, path: &str) -> Result<(), VfsError> {
        let abs = self.resolve_path(path);
        let mut current = self.root;
        let mut walked = String::new();
        for seg in abs.split('/').filter(|s| !s.is_empty()) {
            walked = join(if walked.is_empty() { "/" } else { &walked }, seg);
            current = match self.child(current, seg) {
                Some(id) if self.slot(id).is_some_and(Node::is_dir) => id,
                Some(_) => return Err(VfsError::NotADirectory(walked)),
                None => self.attach(current, seg, Payload::Directory(HashMap::new())),
            };
        }
        Ok(())
    }

    /// Creates the file or replaces the content of an existing one.
    pub fn write_file(&mut self, path: &str, content: &str) -> Result<(), VfsError> {
        self.put_file(path, content).inspect_err(|e| failed("write_file", e))
    }

    fn put_file(&mut self, path: &str, content: &str) -> Result<(), VfsError> {
        let abs = self.resolve_path(path);
        let (parent, name) = self.parent_for(&abs)?;
        match self.child(parent, name) {
            Some(id) => match self.slot_mut(id) {
                Some(Node { payload: Payload::File(existing), modified_at, .. }) => {
                    *existing = content.to_string();
                    *modified_at = Local::now();
                }
                _ => return Err(VfsError::IsADirectory(abs)),
            },
            None => {
                self.attach(parent, name, Payload::File(content.to_string()));
            }
        }
        trace!(path = %abs, bytes = content.len(), "write_file");
        Ok(())
    }

    pub fn read_file(&self, path: &str) -> Option<&str> {
        self.get_node(path)?.content()
    }

    /// Bumps the modification time, creating an empty file when missing.
    pub fn touch(&mut self, path: &str) -> Result<(), VfsError> {
        self.touch_path(path).inspect_err(|e| failed("touch", e))
    }

    fn touch_path(&mut self, path: &str) -> Result<(), VfsError> {
        match self.lookup_id(path) {
            Some(id) => {
                self.touch_id(id);
                Ok(())
            }
            None => self.write_file(path, ""),
        }
    }

    /// Direct children of a directory in no particular order.
    /// `None` lists the current directory.
    pub fn list(&self, path: Option<&str>) -> Option<Vec<&Node>> {
        let dir = self.get_node(path.unwrap_or("."))?;
        let children = dir.children()?;
        children.values().map(|id| self.slot(*id)).collect()
    }

    pub fn change_directory(&mut self, path: &str) -> Result<(), VfsError> {
        self.enter(path).inspect_err(|e| failed("change_directory", e))
    }

    fn enter(&mut self, path: &str) -> Result<(), VfsError> {
        let abs = self.resolve_path(path);
        match self.lookup(&abs).and_then(|id| self.slot(id)) {
            Some(node) if node.is_dir() => {
                self.cwd = abs;
                Ok(())
            }
            Some(_) => Err(VfsError::NotADirectory(abs)),
            None => Err(VfsError::NotFound(abs)),
        }
    }

    pub fn remove(&mut self, path: &str, recursive: bool) -> Result<(), VfsError> {
        self.detach(path, recursive).inspect_err(|e| failed("remove", e))
    }

    fn detach(&mut self, path: &str, recursive: bool) -> Result<(), VfsError> {
        let abs = self.resolve_path(path);
        let id = self
            .lookup(&abs)
            .ok_or_else(|| VfsError::NotFound(abs.clone()))?;
        let node = self.slot(id).ok_or_else(|| VfsError::NotFound(abs.clone()))?;
        let parent = node
            .parent
            .ok_or_else(|| VfsError::InvalidOperation(abs.clone(), "cannot remove the root directory"))?;
        if !recursive && node.children().is_some_and(|c| !c.is_empty()) {
            return Err(VfsError::NotEmpty(abs));
        }
        let name = node.name.clone();
        if let Some(Node { payload: Payload::Directory(children), .. }) = self.slot_mut(parent) {
            children.remove(&name);
        }
        self.touch_id(parent);
        self.release(id);
        trace!(path = %abs, recursive, "remove");
        Ok(())
    }

    // frees the whole subtree
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                if let Payload::Directory(children) = node.payload {
                    stack.extend(children.into_values());
                }
                self.free.push(next.0);
            }
        }
    }

    // into dest when it's an existing dir, else at dest itself
    fn copy_target(&self, src_name: &str, dest: &str) -> Result<(NodeId, String, String), VfsError> {
        let dest_abs = self.resolve_path(dest);
        if let Some(id) = self.lookup(&dest_abs) {
            if self.slot(id).is_some_and(Node::is_dir) {
                return Ok((id, src_name.to_string(), join(&dest_abs, src_name)));
            }
        }
        let (parent, name) = self.parent_for(&dest_abs)?;
        let name = name.to_string();
        Ok((parent, name, dest_abs))
    }

    pub fn copy(&mut self, src: &str, dest: &str, recursive: bool) -> Result<(), VfsError> {
        self.copy_node(src, dest, recursive).inspect_err(|e| failed("copy", e))
    }

    fn copy_node(&mut self, src: &str, dest: &str, recursive: bool) -> Result<(), VfsError> {
        let src_abs = self.resolve_path(src);
        let src_id = self
            .lookup(&src_abs)
            .ok_or_else(|| VfsError::NotFound(src_abs.clone()))?;
        let (src_name, src_is_dir) = match self.slot(src_id) {
            Some(node) => (node.name.clone(), node.is_dir()),
            None => return Err(VfsError::NotFound(src_abs)),
        };
        if src_is_dir && !recursive {
            return Err(VfsError::IsADirectory(src_abs));
        }
        let (parent, name, dest_abs) = self.copy_target(&src_name, dest)?;
        if src_is_dir && self.is_ancestor_or_self(src_id, parent) {
            return Err(VfsError::InvalidOperation(
                dest_abs,
                "cannot copy a directory into itself",
            ));
        }
        if let Some(existing) = self.child(parent, &name) {
            if existing == src_id {
                return Err(VfsError::InvalidOperation(dest_abs, "source and destination are the same"));
            }
            let content = self.slot(src_id).and_then(Node::content).map(str::to_string);
            return match (self.slot_mut(existing), content) {
                (Some(Node { payload: Payload::File(old), modified_at, .. }), Some(new)) => {
                    *old = new;
                    *modified_at = Local::now();
                    Ok(())
                }
                (Some(node), None) if node.is_file() => Err(VfsError::AlreadyExists(dest_abs)),
                _ => Err(VfsError::IsADirectory(dest_abs)),
            };
        }
        self.clone_subtree(src_id, parent, &name);
        trace!(src = %src_abs, dest = %dest_abs, "copy");
        Ok(())
    }

    fn clone_subtree(&mut self, src: NodeId, parent: NodeId, name: &str) {
        let Some(node) = self.slot(src) else { return };
        let permissions = node.permissions.clone();
        let (payload, children): (Payload, Vec<(String, NodeId)>) = match &node.payload {
            Payload::File(content) => (Payload::File(content.clone()), Vec::new()),
            Payload::Directory(children) => (
                Payload::Directory(HashMap::new()),
                children.iter().map(|(n, id)| (n.clone(), *id)).collect(),
            ),
        };
        let copy = self.attach(parent, name, payload);
        if let Some(node) = self.slot_mut(copy) {
            node.permissions = permissions;
        }
        for (child_name, child) in children {
            self.clone_subtree(child, copy, &child_name);
        }
    }

    /// Copy followed by removal of the source.
    ///
    /// Not atomic: if the copy succeeds and removing the source then fails,
    /// the destination is left in place alongside the source and the
    /// removal error is returned.
    pub fn move_node(&mut self, src: &str, dest: &str) -> Result<(), VfsError> {
        self.relocate(src, dest).inspect_err(|e| failed("move_node", e))
    }

    fn relocate(&mut self, src: &str, dest: &str) -> Result<(), VfsError> {
        let src_abs = self.resolve_path(src);
        if src_abs == "/" {
            return Err(VfsError::InvalidOperation(src_abs, "cannot move the root directory"));
        }
        self.copy(&src_abs, dest, true)?;
        self.remove(&src_abs, true)
    }

    pub fn stat(&self, path: &str) -> Option<Metadata> {
        let abs = self.resolve_path(path);
        let node = self.slot(self.lookup(&abs)?)?;
        Some(Metadata {
            path: abs,
            kind: node.kind(),
            size: node.size(),
            created_at: node.created_at,
            modified_at: node.modified_at,
            permissions: node.permissions.clone(),
            owner: node.owner.clone(),
            group: node.group.clone(),
        })
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }
}
