//! External tool wrappers and the process invoker.
//!
//! Each pipeline stage that shells out is backed by a [`ReconTool`]
//! implementation: argument construction, output file location, and lenient
//! output parsing for one binary. The orchestrator core only ever talks to
//! the [`ReconTool`] and [`ToolInvoker`] contracts.

mod amass;
mod base;
mod ffuf;
mod httpx;
mod invoker;
mod nikto;
mod nuclei;
mod outcome;
pub mod registry;

pub use amass::Amass;
pub use base::{ReconTool, binary_on_path, subs_file_path};
pub use ffuf::Ffuf;
pub use httpx::Httpx;
pub use invoker::{ProcessInvoker, ToolInvoker, ToolOutcome};
pub use nikto::Nikto;
pub use nuclei::Nuclei;
pub use outcome::{Classified, classify};
