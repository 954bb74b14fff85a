//! Live libvips registry over FFI.
//!
//! Only the reflection half of the API is used: type-tree queries, nickname
//! lookup, and argument enumeration on a transient operation. No image is
//! ever created. GLib and GObject come from their `-sys` crates; the few
//! libvips entry points are declared here. `build.rs` links libvips through
//! pkg-config when the `libvips` feature is on.

use super::{RawArgument, RawOperation, RegistryError, TypeHandle, TypeRegistry, ValueKind};
use glib_sys::{GType, g_free};
use gobject_sys::{
    G_TYPE_BOOLEAN, G_TYPE_DOUBLE, G_TYPE_ENUM, G_TYPE_FLAG_ABSTRACT, G_TYPE_FLAGS, G_TYPE_INT,
    G_TYPE_STRING, G_TYPE_UINT, GObjectClass, GTypeClass, GTypeInstance, g_object_class_find_property,
    g_object_unref, g_param_spec_get_blurb, g_type_children, g_type_from_name, g_type_is_a,
    g_type_name, g_type_parent, g_type_test_flags,
};
use std::ffi::{CStr, CString, c_char, c_int, c_uint, c_void};
use std::ptr;

type VipsClassMapFn = unsafe extern "C" fn(class: *mut c_void, a: *mut c_void) -> *mut c_void;

unsafe extern "C" {
    fn vips_init(argv0: *const c_char) -> c_int;
    fn vips_shutdown();
    fn vips_error_buffer() -> *const c_char;
    fn vips_error_clear();

    fn vips_operation_get_type() -> GType;
    fn vips_image_get_type() -> GType;
    fn vips_array_double_get_type() -> GType;
    fn vips_array_int_get_type() -> GType;
    fn vips_array_image_get_type() -> GType;
    fn vips_blob_get_type() -> GType;
    fn vips_ref_string_get_type() -> GType;

    fn vips_nickname_find(ty: GType) -> *const c_char;
    fn vips_class_map_all(ty: GType, f: VipsClassMapFn, a: *mut c_void) -> *mut c_void;
    fn vips_operation_new(name: *const c_char) -> *mut c_void;
    fn vips_operation_get_flags(operation: *mut c_void) -> c_int;
    fn vips_object_get_description(object: *mut c_void) -> *const c_char;
    fn vips_object_get_args(
        object: *mut c_void,
        names: *mut *mut *const c_char,
        flags: *mut *mut c_int,
        n_args: *mut c_int,
    ) -> c_int;
    fn vips_object_get_argument_priority(object: *mut c_void, name: *const c_char) -> c_int;
}

/// Copy a borrowed C string. `None` for null.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn owned(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

/// Releases the transient operation on every exit path.
struct ObjectRef(*mut c_void);

impl Drop for ObjectRef {
    fn drop(&mut self) {
        unsafe { g_object_unref(self.0 as *mut _) };
    }
}

unsafe extern "C" fn collect_class_name(class: *mut c_void, a: *mut c_void) -> *mut c_void {
    let names = unsafe { &mut *(a as *mut Vec<String>) };
    let ty = unsafe { (*(class as *const GTypeClass)).g_type };
    if let Some(name) = unsafe { owned(g_type_name(ty)) } {
        names.push(name);
    }
    ptr::null_mut()
}

/// The process-wide libvips type system.
///
/// Creating one initializes libvips; dropping it shuts the library down.
/// Keep a single instance per process.
pub struct NativeRegistry {
    _private: (),
}

impl NativeRegistry {
    pub fn init() -> Result<Self, RegistryError> {
        let argv0 = CString::new("vips-codegen").map_err(|e| RegistryError::Init(e.to_string()))?;
        if unsafe { vips_init(argv0.as_ptr()) } != 0 {
            let message = unsafe { owned(vips_error_buffer()) }.unwrap_or_default();
            unsafe { vips_error_clear() };
            return Err(RegistryError::Init(message.trim().to_string()));
        }
        log::debug!("libvips initialized");
        Ok(Self { _private: () })
    }

    fn gtype(ty: TypeHandle) -> GType {
        ty.0 as GType
    }

    fn handle(ty: GType) -> Option<TypeHandle> {
        (ty != 0).then_some(TypeHandle(ty as u64))
    }
}

impl Drop for NativeRegistry {
    fn drop(&mut self) {
        unsafe { vips_shutdown() };
    }
}

impl TypeRegistry for NativeRegistry {
    fn find_type(&self, name: &str) -> Option<TypeHandle> {
        let name = CString::new(name).ok()?;
        Self::handle(unsafe { g_type_from_name(name.as_ptr()) })
    }

    fn children(&self, ty: TypeHandle) -> Vec<TypeHandle> {
        let mut n: c_uint = 0;
        let raw = unsafe { g_type_children(Self::gtype(ty), &mut n) };
        if raw.is_null() {
            return Vec::new();
        }
        let kids = unsafe { std::slice::from_raw_parts(raw, n as usize) }
            .iter()
            .filter_map(|&t| Self::handle(t))
            .collect();
        unsafe { g_free(raw as *mut _) };
        kids
    }

    fn parent(&self, ty: TypeHandle) -> Option<TypeHandle> {
        Self::handle(unsafe { g_type_parent(Self::gtype(ty)) })
    }

    fn type_name(&self, ty: TypeHandle) -> Option<String> {
        if !ty.is_valid() {
            return None;
        }
        unsafe { owned(g_type_name(Self::gtype(ty))) }
    }

    fn nickname(&self, ty: TypeHandle) -> Option<String> {
        unsafe { owned(vips_nickname_find(Self::gtype(ty))) }
    }

    fn is_abstract(&self, ty: TypeHandle) -> bool {
        unsafe { g_type_test_flags(Self::gtype(ty), G_TYPE_FLAG_ABSTRACT) != 0 }
    }

    fn is_a(&self, ty: TypeHandle, ancestor: TypeHandle) -> bool {
        unsafe { g_type_is_a(Self::gtype(ty), Self::gtype(ancestor)) != 0 }
    }

    fn value_type_is(&self, ty: TypeHandle, kind: ValueKind) -> bool {
        let gtype = Self::gtype(ty);
        if gtype == 0 {
            return false;
        }
        let derives = |base: GType| unsafe { g_type_is_a(gtype, base) != 0 };
        match kind {
            ValueKind::Image => derives(unsafe { vips_image_get_type() }),
            ValueKind::ArrayDouble => derives(unsafe { vips_array_double_get_type() }),
            ValueKind::ArrayInt => derives(unsafe { vips_array_int_get_type() }),
            ValueKind::ArrayImage => derives(unsafe { vips_array_image_get_type() }),
            ValueKind::Blob => derives(unsafe { vips_blob_get_type() }),
            ValueKind::RefString => derives(unsafe { vips_ref_string_get_type() }),
            ValueKind::Double => gtype == G_TYPE_DOUBLE,
            ValueKind::Int => gtype == G_TYPE_INT,
            ValueKind::UInt => gtype == G_TYPE_UINT,
            ValueKind::Boolean => gtype == G_TYPE_BOOLEAN,
            ValueKind::String => gtype == G_TYPE_STRING,
            ValueKind::Enum => derives(G_TYPE_ENUM),
            ValueKind::Flags => derives(G_TYPE_FLAGS),
        }
    }

    fn list_classes(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        unsafe {
            vips_class_map_all(
                vips_operation_get_type(),
                collect_class_name,
                &mut names as *mut Vec<String> as *mut c_void,
            );
        }
        names
    }

    fn lookup_operation(&self, nickname: &str) -> Option<RawOperation> {
        let c_nickname = CString::new(nickname).ok()?;
        let op = unsafe { vips_operation_new(c_nickname.as_ptr()) };
        if op.is_null() {
            unsafe { vips_error_clear() };
            return None;
        }
        let guard = ObjectRef(op);

        let class = unsafe { (*(guard.0 as *const GTypeInstance)).g_class };
        let type_name = unsafe { owned(g_type_name((*class).g_type)) }.unwrap_or_default();
        let description = unsafe { owned(vips_object_get_description(guard.0)) }.unwrap_or_default();
        let flags = unsafe { vips_operation_get_flags(guard.0) } as u32;

        let mut names: *mut *const c_char = ptr::null_mut();
        let mut arg_flags: *mut c_int = ptr::null_mut();
        let mut n_args: c_int = 0;
        let mut arguments = Vec::new();
        // names and flags are owned by the class; nothing to free.
        if unsafe { vips_object_get_args(guard.0, &mut names, &mut arg_flags, &mut n_args) } == 0 {
            for i in 0..n_args.max(0) as usize {
                let name_ptr = unsafe { *names.add(i) };
                let pspec = unsafe { g_object_class_find_property(class as *mut GObjectClass, name_ptr) };
                if pspec.is_null() {
                    continue;
                }
                let Some(name) = (unsafe { owned(name_ptr) }) else {
                    continue;
                };
                arguments.push(RawArgument {
                    name,
                    value_type: TypeHandle(unsafe { (*pspec).value_type } as u64),
                    flags: unsafe { *arg_flags.add(i) } as u32,
                    priority: unsafe { vips_object_get_argument_priority(guard.0, name_ptr) },
                    blurb: unsafe { owned(g_param_spec_get_blurb(pspec)) }.unwrap_or_default(),
                });
            }
        }

        Some(RawOperation {
            type_name,
            nickname: nickname.to_string(),
            description,
            flags,
            arguments,
        })
    }
}
