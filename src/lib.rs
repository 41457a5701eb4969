//! tdz — a build-time transform that rewrites `typedData<T>()` marker calls
//! into a literal array of property records describing `T`'s fields.
//!
//! One pass over a unit runs in two phases: **collect** (scan, parse, bind
//! every top-level declaration) and **rewrite** (replace each call that
//! resolves to the marker sentinel with the serialized walk of its type
//! argument). Source text outside replaced spans is emitted byte for byte.
//!
//! ```
//! use tdz::{CompileOptions, compile_source};
//!
//! let source = "\
//! import { typedData } from 'typed-data';
//! interface Foo { a?: string }
//! const keys = typedData<Foo>();
//! ";
//! let out = compile_source(source, "demo.ts", &CompileOptions::default()).unwrap();
//! assert!(out.contains(r#""name":"a""#));
//! ```

pub mod ast;
pub mod binder;
pub mod classifier;
pub mod cli;
pub mod compiler;
pub mod diagnostics;
pub mod emitter;
pub mod parser;
pub mod scanner;
pub mod span;
pub mod tracing_config;
pub mod transform;
pub mod walker;

pub use classifier::PropertyType;
pub use compiler::{CompileOptions, compile_file, compile_source};
pub use diagnostics::{CompileError, Diagnostic, DiagnosticBag, DiagnosticSeverity};
pub use walker::Property;
