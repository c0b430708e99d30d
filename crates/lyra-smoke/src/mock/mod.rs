//! Scripted automation backend.
//!
//! A [`MockScene`] describes the objects a game build would expose (menus,
//! buttons, the player controller, the pawn) and how they react to clicks
//! and method calls. [`MockConnector`] hands out [`MockClient`]s over that
//! scene, so scenario catalogs can be exercised without a running build.
//!
//! ## Example
//!
//! ```rust
//! use lyra_smoke::mock::{MockClient, MockScene, SceneObject};
//! use lyra_smoke::{AutomationClient, Locator};
//!
//! let scene = MockScene::new().with_object(SceneObject::new("//Menu").appears_after(1));
//! let mut client = MockClient::new(scene);
//! let menu = Locator::new("//Menu");
//! assert!(!client.object_exists(&menu).unwrap());
//! assert!(client.object_exists(&menu).unwrap());
//! ```

mod client;
mod process;
mod scene;

pub use client::{MockClient, MockConnector};
pub use process::{MockProcess, MockProcessHandle};
pub use scene::{MockCall, MockScene, SceneEffect, SceneObject};
