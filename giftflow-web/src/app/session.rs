//! The tab's flow session and the yew state mirroring it.
use crate::clock::BrowserClock;
use crate::remote::WebRemote;
use crate::storage::BrowserStore;
use giftflow_core::{AppState, ContentConfig, FlowController};
use std::rc::Rc;
use yew::prelude::*;

pub type WebFlow = FlowController<BrowserStore, WebRemote, BrowserClock>;

#[must_use]
pub fn create_web_flow() -> WebFlow {
    FlowController::with_doc_id(
        BrowserStore,
        WebRemote::from_build_env(),
        BrowserClock,
        crate::paths::remote_doc_id(),
    )
}

/// Render-side copies of the controller's state. The controller stays the
/// source of truth; these handles only trigger re-renders.
#[derive(Clone)]
pub struct FlowView {
    pub progress: UseStateHandle<AppState>,
    pub config: UseStateHandle<ContentConfig>,
    pub log_revision: UseStateHandle<u32>,
}

impl FlowView {
    pub fn bump_log(&self) {
        self.log_revision.set(self.log_revision.wrapping_add(1));
    }
}

#[hook]
pub fn use_flow() -> (Rc<WebFlow>, FlowView) {
    let flow = use_memo((), |()| create_web_flow());
    let view = FlowView {
        progress: use_state(|| flow.state()),
        config: use_state(|| flow.config()),
        log_revision: use_state(|| 0_u32),
    };

    {
        let flow = Rc::clone(&flow);
        let progress = view.progress.clone();
        use_effect_with((), move |()| {
            let watch = flow.watch_state(move |state: &AppState| progress.set(state.clone()));
            move || {
                drop(watch);
                flow.shutdown();
            }
        });
    }

    (flow, view)
}
