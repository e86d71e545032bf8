//! Asset registry
//!
//! Typed asset instances keyed by interned path, ref-counted, with a
//! parent-child dependency graph. Loading `"ui/hud.json"` from inside
//! another asset's loader records the child in the parent's dependency
//! list via the load stack, so dropping the root releases the whole
//! subtree.
//!
//! The registry is generic over an application context `C` (graphics
//! state, whatever else loaders need); type capabilities are plain
//! function pointers, so the set of asset types stays open.

use core::any::Any;

use hashbrown::HashMap;

use crate::handle::Handle;
use crate::sparse::SparseSet;
use crate::strings::StringTable;

/// Per-type capabilities.
///
/// `load` runs with the asset's meta slot already acquired and the name
/// mapping installed, so recursive [`Assets::load`] calls from inside it
/// resolve self-references by name and attribute children to this asset.
/// Returning `None` fails the load: the registry unwinds the slots it
/// acquired and hands the caller the null handle.
pub struct AssetTypeInfo<C> {
    pub load: fn(ctx: &mut C, assets: &mut Assets<C>, handle: Handle) -> Option<Box<dyn Any>>,
    pub drop: fn(ctx: &mut C, assets: &mut Assets<C>, handle: Handle, payload: Box<dyn Any>),
}

impl<C> Clone for AssetTypeInfo<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for AssetTypeInfo<C> {}

struct AssetMeta {
    /// Child meta handles, in load order. Private to this asset.
    deps: Vec<Handle>,
    inst: Handle,
    type_id: Handle,
    name_id: Handle,
    /// Zero-based: 0 means one reference is outstanding.
    ref_count: u32,
}

struct AssetInst {
    payload: Option<Box<dyn Any>>,
}

struct AssetType<C> {
    info: AssetTypeInfo<C>,
    instances: SparseSet<AssetInst>,
}

/// The registry. Thread-confined; no async loading, though a higher
/// layer can drive one.
pub struct Assets<C> {
    names: StringTable,
    meta: SparseSet<AssetMeta>,
    lookup: HashMap<Handle, Handle>,
    types: HashMap<Handle, AssetType<C>>,
    extensions: HashMap<Handle, Handle>,
    stack: Vec<Handle>,
}

impl<C> Assets<C> {
    pub fn new() -> Self {
        Self {
            names: StringTable::new(),
            meta: SparseSet::new(),
            lookup: HashMap::new(),
            types: HashMap::new(),
            extensions: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Number of live asset instances across every type.
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// Registers (or replaces) an asset type.
    pub fn type_set(&mut self, type_name: &str, info: AssetTypeInfo<C>) {
        let type_id = self.names.add(type_name);
        if type_id.is_none() {
            tracing::warn!("empty asset type name");
            return;
        }
        let previous = self.types.insert(
            type_id,
            AssetType {
                info,
                instances: SparseSet::new(),
            },
        );
        if let Some(previous) = previous
            && !previous.instances.is_empty()
        {
            tracing::warn!(
                "asset type '{type_name}' replaced with {} live instances",
                previous.instances.len()
            );
        }
    }

    /// Maps a filename extension (without the dot) to a type. Multiple
    /// extensions may map to the same type.
    pub fn type_map(&mut self, type_name: &str, extension: &str) {
        let type_id = self.names.add(type_name);
        let extension_id = self.names.add(extension);
        if type_id.is_none() || extension_id.is_none() {
            tracing::warn!("empty asset type or extension");
            return;
        }
        self.extensions.insert(extension_id, type_id);
    }

    /// Unregisters a type, dropping every live instance of it first.
    pub fn type_del(&mut self, ctx: &mut C, type_name: &str) {
        let type_id = self.names.find(type_name);
        if !self.types.contains_key(&type_id) {
            return;
        }

        let metas: Vec<Handle> = self
            .meta
            .iter()
            .filter(|(_, meta)| meta.type_id == type_id)
            .map(|(handle, _)| handle)
            .collect();

        for handle in metas {
            // Force the instance down regardless of outstanding references.
            if let Some(meta) = self.meta.get_mut(handle) {
                meta.ref_count = 0;
            }
            self.unload(ctx, handle);
        }

        self.types.remove(&type_id);
        for ext in self
            .extensions
            .iter()
            .filter(|&(_, &ty)| ty == type_id)
            .map(|(&ext, _)| ext)
            .collect::<Vec<_>>()
        {
            self.extensions.remove(&ext);
        }
    }

    /// Loads an asset by name, or retains the existing instance.
    ///
    /// The type is picked from the extension mapping; an unmapped
    /// extension falls back to naming a type directly. Returns the null
    /// handle when the name is empty, no type matches, or the loader
    /// fails.
    pub fn load(&mut self, ctx: &mut C, name: &str) -> Handle {
        let name_id = self.names.add(name);
        if name_id.is_none() {
            return Handle::NONE;
        }

        if let Some(&existing) = self.lookup.get(&name_id) {
            self.add_dependency(existing);
            if let Some(meta) = self.meta.get_mut(existing) {
                meta.ref_count += 1;
                tracing::debug!(refs = meta.ref_count + 1, "[refc] {existing:?} {name}");
            }
            return existing;
        }

        let extension_id = self.names.find(extension_of(name));
        if extension_id.is_none() {
            tracing::warn!("no known extension on '{name}'");
            return Handle::NONE;
        }
        let type_id = self
            .extensions
            .get(&extension_id)
            .copied()
            .unwrap_or(extension_id);

        let Some(ty) = self.types.get_mut(&type_id) else {
            tracing::warn!("no asset type registered for '{name}'");
            return Handle::NONE;
        };

        let inst = ty.instances.acquire(AssetInst { payload: None });
        let handle = self.meta.acquire(AssetMeta {
            deps: Vec::new(),
            inst,
            type_id,
            name_id,
            ref_count: 0,
        });
        self.lookup.insert(name_id, handle);
        self.add_dependency(handle);

        let load = self.types[&type_id].info.load;
        self.stack.push(handle);
        let payload = load(ctx, self, handle);
        self.stack.pop();

        match payload {
            Some(payload) => {
                if let Some(ty) = self.types.get_mut(&type_id)
                    && let Some(slot) = ty.instances.get_mut(inst)
                {
                    slot.payload = Some(payload);
                }
                tracing::debug!("[load] {handle:?} {name}");
                handle
            }
            None => {
                tracing::warn!("loading '{name}' failed");
                self.unwind_failed_load(ctx, handle, type_id, inst, name_id);
                Handle::NONE
            }
        }
    }

    /// Releases one reference; at zero, runs the type's drop hook,
    /// recursively drops the dependency subtree, and frees the slots.
    pub fn unload(&mut self, ctx: &mut C, handle: Handle) {
        let Some(meta) = self.meta.get_mut(handle) else {
            return;
        };
        if meta.ref_count > 0 {
            meta.ref_count -= 1;
            tracing::debug!(refs = meta.ref_count + 1, "[unrf] {handle:?}");
            return;
        }

        let type_id = meta.type_id;
        let inst = meta.inst;
        let name_id = meta.name_id;

        let payload = self
            .types
            .get_mut(&type_id)
            .and_then(|ty| ty.instances.get_mut(inst))
            .and_then(|slot| slot.payload.take());
        if let Some(payload) = payload {
            let drop_fn = self.types[&type_id].info.drop;
            tracing::debug!("[drop] {handle:?}");
            self.stack.push(handle);
            drop_fn(ctx, self, handle, payload);
            self.stack.pop();
        }
        if let Some(ty) = self.types.get_mut(&type_id) {
            ty.instances.discard(inst);
        }

        let deps = match self.meta.get_mut(handle) {
            Some(meta) => core::mem::take(&mut meta.deps),
            None => Vec::new(),
        };
        self.stack.push(handle);
        for dep in deps {
            self.unload(ctx, dep);
        }
        self.stack.pop();

        self.lookup.remove(&name_id);
        self.meta.discard(handle);
    }

    /// Typed access to an instance payload. `None` while the asset is
    /// still inside its own loader, or on a stale handle or a type
    /// mismatch.
    pub fn get<T: Any>(&self, handle: Handle) -> Option<&T> {
        let meta = self.meta.get(handle)?;
        let ty = self.types.get(&meta.type_id)?;
        let inst = ty.instances.get(meta.inst)?;
        inst.payload.as_ref()?.downcast_ref::<T>()
    }

    pub fn get_mut<T: Any>(&mut self, handle: Handle) -> Option<&mut T> {
        let meta = self.meta.get(handle)?;
        let ty = self.types.get_mut(&meta.type_id)?;
        let inst = ty.instances.get_mut(meta.inst)?;
        inst.payload.as_mut()?.downcast_mut::<T>()
    }

    /// Looks a loaded asset up by name without retaining it.
    pub fn find(&self, name: &str) -> Handle {
        let name_id = self.names.find(name);
        if name_id.is_none() {
            return Handle::NONE;
        }
        self.lookup.get(&name_id).copied().unwrap_or(Handle::NONE)
    }

    pub fn name(&self, handle: Handle) -> Option<&str> {
        let meta = self.meta.get(handle)?;
        self.names.get(meta.name_id)
    }

    pub fn type_name(&self, handle: Handle) -> Option<&str> {
        let meta = self.meta.get(handle)?;
        self.names.get(meta.type_id)
    }

    /// Outstanding references beyond the first; `None` for a dead handle.
    pub fn ref_count(&self, handle: Handle) -> Option<u32> {
        Some(self.meta.get(handle)?.ref_count)
    }

    /// Dependency handles recorded for this asset, in load order.
    pub fn dependencies(&self, handle: Handle) -> Option<&[Handle]> {
        Some(self.meta.get(handle)?.deps.as_slice())
    }

    /// Drops everything: every live instance of every type, whatever its
    /// reference count. Used on shutdown.
    pub fn drop_all(&mut self, ctx: &mut C) {
        let type_names: Vec<String> = self
            .types
            .keys()
            .filter_map(|&type_id| self.names.get(type_id).map(str::to_owned))
            .collect();
        for type_name in type_names {
            self.type_del(ctx, &type_name);
        }
    }

    fn add_dependency(&mut self, handle: Handle) {
        let Some(&parent) = self.stack.last() else {
            return;
        };
        if let Some(meta) = self.meta.get_mut(parent) {
            meta.deps.push(handle);
        }
    }

    fn unwind_failed_load(
        &mut self,
        ctx: &mut C,
        handle: Handle,
        type_id: Handle,
        inst: Handle,
        name_id: Handle,
    ) {
        // Children the failed loader already pulled in are live retains;
        // release them before the meta goes away.
        let deps = match self.meta.get_mut(handle) {
            Some(meta) => core::mem::take(&mut meta.deps),
            None => Vec::new(),
        };
        for dep in deps {
            if dep != handle {
                self.unload(ctx, dep);
            }
        }
        if let Some(ty) = self.types.get_mut(&type_id) {
            ty.instances.discard(inst);
        }
        self.lookup.remove(&name_id);
        self.meta.discard(handle);
    }
}

impl<C> Default for Assets<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension of `name`: the run after the last `.`, not crossing a `/`.
fn extension_of(name: &str) -> &str {
    let bytes = name.as_bytes();
    for (scanned, &byte) in bytes.iter().rev().enumerate() {
        if byte == b'.' {
            return &name[name.len() - scanned..];
        }
        if byte == b'/' {
            break;
        }
    }
    ""
}
