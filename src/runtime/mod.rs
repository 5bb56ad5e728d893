/*!
Executable model of the generated consent runtime.

The emitted JavaScript and [`ConsentRuntime`] are driven by the same
[`LoadPlan`](crate::generator::LoadPlan), so the category gating, dedup and
deferral behavior can be exercised from Rust:

```
use bannergen::config::BannerConfig;
use bannergen::runtime::{ConsentRuntime, RecordingHost, UiElement};

let mut rt = ConsentRuntime::new(&BannerConfig::default(), RecordingHost::new());
rt.page_load();
rt.accept_all();
assert!(!rt.host().is_visible(UiElement::Banner));
```
*/

pub mod consent;
pub mod engine;
pub mod host;
pub mod injector;
pub mod scenario;

pub use consent::{ConsentIcon, ConsentState, Toggle, Toggles};
pub use engine::{ConsentRuntime, UiState};
pub use host::{BrowserHost, GtagCall, RecordingHost, UiElement};
pub use injector::{Injection, ScriptInjector};
pub use scenario::{Scenario, SimulationReport};
