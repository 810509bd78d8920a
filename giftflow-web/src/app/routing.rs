use crate::app::session::WebFlow;
use crate::router::Route;
use crate::storage::BrowserSignals;
use giftflow_core::{ContentConfig, Navigation, Step};
use std::rc::Rc;
use yew::prelude::*;
use yew_router::prelude::{Navigator, Routable};

/// Where `route` must be sent for a visitor at `step`, if anywhere.
#[must_use]
pub fn gate_redirect(route: &Route, step: Step) -> Option<Route> {
    giftflow_core::evaluate(&route.to_path(), step).and_then(Route::recognize)
}

fn apply(navigation: Navigation, navigator: Option<&Navigator>) {
    let Navigation::Replace(target) = navigation else {
        return;
    };
    match (navigator, Route::recognize(target)) {
        (Some(navigator), Some(route)) => navigator.replace(&route),
        _ => log::warn!("Cannot redirect to {target}: router unavailable"),
    }
}

/// Open the session on the first route and gate every later route change.
#[hook]
pub fn use_route_gate(
    flow: &Rc<WebFlow>,
    config: &UseStateHandle<ContentConfig>,
    navigator: Option<Navigator>,
    route: Route,
) {
    let opened = use_mut_ref(|| false);
    let flow = Rc::clone(flow);
    let config = config.clone();
    use_effect_with(route, move |route| {
        let path = route.to_path();
        let first_visit = !*opened.borrow();
        let navigation = if first_visit {
            *opened.borrow_mut() = true;
            flow.open(&path, &BrowserSignals, move |cfg: &ContentConfig| {
                config.set(cfg.clone());
            })
        } else {
            flow.on_route_change(&path)
        };
        apply(navigation, navigator.as_ref());
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_ahead_of_progress_are_redirected() {
        assert_eq!(gate_redirect(&Route::Places, Step::Puzzle), Some(Route::Puzzle));
        assert_eq!(gate_redirect(&Route::Summary, Step::Landing), Some(Route::Landing));
        assert_eq!(gate_redirect(&Route::Puzzle, Step::Puzzle), None);
        assert_eq!(gate_redirect(&Route::Landing, Step::Summary), None);
    }

    #[test]
    fn routes_outside_the_flow_are_never_gated() {
        for step in Step::ALL {
            assert_eq!(gate_redirect(&Route::Admin, step), None);
            assert_eq!(gate_redirect(&Route::NotFound, step), None);
        }
    }
}
