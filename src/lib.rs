// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Superluminal Performance API for Rust
//! Instrumentation events and thread names for [Superluminal Performance].
//!
//! [Superluminal Performance]: https://superluminal.eu
//!
//! ### Usage
//!
//! Call [`initialize`] once at startup. It [dlopen(3)]'s (or `LoadLibrary`'s) the
//! `PerformanceAPI` library that ships with Superluminal, from the installation
//! directory by default (see [`loader::default_library_path`]), or from the path you pass.
//!
//! If the library is not there, for example because Superluminal is not installed,
//! [`initialize`] still succeeds and every other function in this crate does nothing.
//! Your program runs the same with or without the profiler.
//!
//! [dlopen(3)]: https://linux.die.net/man/3/dlopen
//!
//! ```no_run
//! # fn load(_: &str) {}
//! superluminal_perf::initialize(None)?;
//! superluminal_perf::set_current_thread_name("Loader");
//!
//! for file in ["a.txt", "b.txt"] {
//!     let _event = superluminal_perf::begin_event("LoadFile", Some(file));
//!     load(file);
//! } // the event ends when `_event` is dropped
//! # Ok::<(), superluminal_perf::InitError>(())
//! ```
//!
//! Events nest like a call stack. They must end in the reverse order they began,
//! on the thread that began them. This is not checked.
//!
//! ### Hot paths
//!
//! [`begin_event`] converts its strings to the platform's `wchar_t` encoding on
//! every call. Short strings are converted on the stack. If you already have UTF-8
//! bytes and know their character count, [`begin_event_utf8`] and
//! [`set_current_thread_name_utf8`] pass them through without any conversion.
//!
//! Instrumentation can be turned off at any time with [`set_enabled`].
mod api;

pub mod color;
pub mod loader;

pub use api::{
    api_version, begin_event, begin_event_utf8, begin_event_with_color, end_event, initialize,
    is_available, is_enabled, set_current_thread_name, set_current_thread_name_utf8, set_enabled,
    EventMarker,
};
pub use color::ProfilerColor;
pub use loader::{ApiVersion, InitError, InitOptions};
