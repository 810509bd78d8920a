#[cfg(target_arch = "wasm32")]
use crate::router::Route;
#[cfg(target_arch = "wasm32")]
use yew::prelude::*;
#[cfg(target_arch = "wasm32")]
use yew_router::prelude::*;

pub mod handlers;
pub mod routing;
pub mod session;
pub mod view;

pub use session::{FlowView, WebFlow, create_web_flow};

#[cfg(target_arch = "wasm32")]
#[function_component(App)]
pub fn app() -> Html {
    let router_base = crate::paths::router_base().map(AttrValue::from);
    html! {
        <BrowserRouter basename={router_base}>
            <AppInner />
        </BrowserRouter>
    }
}

#[cfg(target_arch = "wasm32")]
#[function_component(AppInner)]
pub fn app_inner() -> Html {
    let (flow, flow_view) = session::use_flow();
    let navigator = use_navigator();
    let route = use_route::<Route>().unwrap_or(Route::NotFound);

    routing::use_route_gate(&flow, &flow_view.config, navigator.clone(), route.clone());

    // A gated route never renders, not even for one frame; the gate effect
    // replaces the history entry.
    if routing::gate_redirect(&route, flow.step()).is_some() {
        return Html::default();
    }
    view::render_route(&flow, &flow_view, &route, navigator)
}
