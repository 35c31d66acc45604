// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    marker::PhantomData,
    path::Path,
    ptr,
    sync::{
        atomic::{AtomicBool, Ordering},
        OnceLock,
    },
};

use crate::{
    color::ProfilerColor,
    loader::{ApiVersion, DynamicLoader, InitError, InitOptions, LibraryLoader, LoadedLibrary},
};

pub(crate) mod raw;
mod wide;

use wide::{clamp_count, WideString};

enum ApiState {
    Unresolved,
    Resolved(ResolvedApi),
}

struct ResolvedApi {
    version: ApiVersion,
    functions: raw::PerformanceAPI_Functions,
    _library: LoadedLibrary,
}

/// Forwards calls to a `PerformanceAPI` function table, once one is resolved.
///
/// Every call checks the enabled flag and the function pointer it needs, and
/// does nothing if either is missing.
pub(crate) struct PerformanceApi<L> {
    loader: L,
    enabled: AtomicBool,
    state: OnceLock<ApiState>,
}

impl<L> PerformanceApi<L> {
    pub(crate) const fn new(loader: L) -> Self {
        PerformanceApi {
            loader,
            enabled: AtomicBool::new(true),
            state: OnceLock::new(),
        }
    }
}

impl<L: LibraryLoader> PerformanceApi<L> {
    /// Resolves the function table on the first call. Later calls do nothing.
    pub(crate) fn initialize(&self, options: &InitOptions) -> Result<(), InitError> {
        let mut result = Ok(());
        self.state.get_or_init(|| match self.resolve(options) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(%err, "unable to initialize Superluminal PerformanceAPI");
                result = Err(err);
                ApiState::Unresolved
            }
        });
        result
    }

    fn resolve(&self, options: &InitOptions) -> Result<ApiState, InitError> {
        let path = options.library_path()?;
        tracing::debug!(path = %path.display(), "loading Superluminal PerformanceAPI");

        let loaded = self
            .loader
            .load(&path)
            .and_then(|library| Ok((library.negotiate()?, library)));
        Ok(match loaded {
            Ok(((version, functions), library)) => {
                tracing::debug!(?version, "Superluminal PerformanceAPI loaded");
                ApiState::Resolved(ResolvedApi {
                    version,
                    functions,
                    _library: library,
                })
            }
            Err(err) => {
                tracing::debug!(%err, "Superluminal PerformanceAPI unavailable, instrumentation disabled");
                ApiState::Unresolved
            }
        })
    }

    fn resolved(&self) -> Option<&ResolvedApi> {
        match self.state.get()? {
            ApiState::Resolved(api) => Some(api),
            ApiState::Unresolved => None,
        }
    }

    /// The function table, if calls should go through right now.
    fn functions(&self) -> Option<&raw::PerformanceAPI_Functions> {
        if !self.enabled.load(Ordering::Relaxed) {
            return None;
        }
        self.resolved().map(|api| &api.functions)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn api_version(&self) -> Option<ApiVersion> {
        self.resolved().map(|api| api.version)
    }

    pub(crate) fn set_current_thread_name(&self, name: &str) {
        let Some(set_current_thread_name) = self.functions().and_then(|f| f.SetCurrentThreadNameN)
        else {
            return;
        };
        // safety: name is valid for its whole length for the duration of the call
        unsafe {
            set_current_thread_name(name.as_ptr().cast(), clamp_count(name.chars().count()));
        }
    }

    pub(crate) fn set_current_thread_name_utf8(&self, name: &[u8], name_char_count: u16) {
        let Some(set_current_thread_name) = self.functions().and_then(|f| f.SetCurrentThreadNameN)
        else {
            return;
        };
        unsafe { set_current_thread_name(name.as_ptr().cast(), name_char_count) }
    }

    pub(crate) fn begin_event(&self, event_id: &str, data: Option<&str>, color: ProfilerColor) {
        let Some(begin_event) = self.functions().and_then(|f| f.BeginEventWideN) else {
            return;
        };
        let event_id = WideString::new(event_id);
        let data = data.map(WideString::new);
        let (data_ptr, data_char_count) = match &data {
            Some(data) => (data.as_ptr(), data.char_count()),
            None => (ptr::null(), 0),
        };
        // safety: both buffers outlive the call, and the counts match them
        unsafe {
            begin_event(
                event_id.as_ptr(),
                event_id.char_count(),
                data_ptr,
                data_char_count,
                color.value(),
            );
        }
    }

    pub(crate) fn begin_event_utf8(
        &self,
        event_id: &[u8],
        event_char_count: u16,
        data: &[u8],
        data_char_count: u16,
        color: ProfilerColor,
    ) {
        let Some(begin_event) = self.functions().and_then(|f| f.BeginEventN) else {
            return;
        };
        let (data_ptr, data_char_count) = if data.is_empty() {
            (ptr::null(), 0)
        } else {
            (data.as_ptr().cast(), data_char_count)
        };
        unsafe {
            begin_event(
                event_id.as_ptr().cast(),
                event_char_count,
                data_ptr,
                data_char_count,
                color.value(),
            );
        }
    }

    #[inline(never)]
    pub(crate) fn end_event(&self) {
        if let Some(end_event) = self.functions().and_then(|f| f.EndEvent) {
            // the result must stay live, so the call is not lowered to a tail jump
            std::hint::black_box(unsafe { end_event() });
        }
    }
}

static PERFORMANCE_API: PerformanceApi<DynamicLoader> = PerformanceApi::new(DynamicLoader);

pub(crate) fn global() -> &'static PerformanceApi<DynamicLoader> {
    &PERFORMANCE_API
}

/// Initialize the Superluminal Performance API. Call this at application startup.
///
/// Without `library_path`, `PerformanceAPI` is loaded from the default
/// installation directory (see [`default_library_path`](crate::loader::default_library_path)).
/// If it cannot be found or loaded, this still returns `Ok` and every other
/// function in this crate does nothing.
///
/// Only the first call in a process has any effect.
pub fn initialize(library_path: Option<&Path>) -> Result<(), InitError> {
    let mut options = InitOptions::default();
    if let Some(path) = library_path {
        options = options.with_library_path(path);
    }
    options.initialize()
}

/// Enable or disable all instrumentation. Enabled by default.
pub fn set_enabled(enabled: bool) {
    PERFORMANCE_API.set_enabled(enabled)
}

/// Whether instrumentation is enabled.
pub fn is_enabled() -> bool {
    PERFORMANCE_API.is_enabled()
}

/// Whether `PerformanceAPI` was loaded and its function table resolved.
pub fn is_available() -> bool {
    PERFORMANCE_API.api_version().is_some()
}

/// The API version negotiated with `PerformanceAPI`, if it was loaded.
pub fn api_version() -> Option<ApiVersion> {
    PERFORMANCE_API.api_version()
}

/// Set the name of the current thread.
pub fn set_current_thread_name(name: &str) {
    PERFORMANCE_API.set_current_thread_name(name)
}

/// Set the name of the current thread from an already UTF-8 encoded name.
///
/// `name_char_count` is the number of characters, not bytes, in `name`.
/// Useful to avoid recounting a name that is set repeatedly.
pub fn set_current_thread_name_utf8(name: &[u8], name_char_count: u16) {
    PERFORMANCE_API.set_current_thread_name_utf8(name, name_char_count)
}

/// Begin an instrumentation event with the default color.
///
/// `event_id` must stay the same over the lifetime of the program for a
/// given scope, while `data` can hold anything only known at runtime.
///
/// The event ends when the returned marker is dropped. Events must end in
/// the reverse order they began, on the thread that began them.
pub fn begin_event(event_id: &str, data: Option<&str>) -> EventMarker {
    begin_event_with_color(event_id, data, ProfilerColor::DEFAULT)
}

/// Begin an instrumentation event with the given color.
pub fn begin_event_with_color(
    event_id: &str,
    data: Option<&str>,
    color: ProfilerColor,
) -> EventMarker {
    PERFORMANCE_API.begin_event(event_id, data, color);
    EventMarker::new()
}

/// Begin an instrumentation event from already UTF-8 encoded strings.
///
/// The char counts are numbers of characters, not bytes. An empty `data`
/// is sent as no data.
pub fn begin_event_utf8(
    event_id: &[u8],
    event_char_count: u16,
    data: &[u8],
    data_char_count: u16,
    color: ProfilerColor,
) -> EventMarker {
    PERFORMANCE_API.begin_event_utf8(event_id, event_char_count, data, data_char_count, color);
    EventMarker::new()
}

/// End the innermost instrumentation event of the current thread.
///
/// Only needed for events whose [`EventMarker`] was [forgotten](EventMarker::forget).
#[inline(never)]
pub fn end_event() {
    PERFORMANCE_API.end_event()
}

/// Ends its instrumentation event when dropped.
///
/// Returned by [`begin_event`] and friends. Use [`forget`](EventMarker::forget)
/// to end the event manually with [`end_event`] instead.
#[must_use = "dropping the marker ends the event immediately"]
#[derive(Debug)]
pub struct EventMarker {
    // events nest per thread
    _not_send: PhantomData<*const ()>,
}

impl EventMarker {
    fn new() -> Self {
        EventMarker {
            _not_send: PhantomData,
        }
    }

    /// End the event now.
    pub fn end(self) {
        drop(self)
    }

    /// Discard the marker without ending the event.
    pub fn forget(self) {
        std::mem::forget(self)
    }
}

impl Drop for EventMarker {
    fn drop(&mut self) {
        end_event();
    }
}
