use crate::app::handlers::FlowHandlers;
use crate::app::session::{FlowView, WebFlow};
use crate::components::music::MusicToggle;
use crate::components::step_header::StepHeader;
use crate::pages::{
    admin::AdminPage, landing::LandingPage, message::MessagePage, not_found::NotFound,
    outfits::OutfitsPage, places::PlacesPage, puzzle::PuzzlePage,
    summary::{SummaryPage, plan_for},
};
use crate::router::Route;
use giftflow_core::Step;
use std::rc::Rc;
use yew::prelude::*;
use yew_router::prelude::Navigator;

pub fn render_route(
    flow: &Rc<WebFlow>,
    view: &FlowView,
    route: &Route,
    navigator: Option<Navigator>,
) -> Html {
    let handlers = FlowHandlers::new(flow, view, navigator);
    let state = &*view.progress;
    let config = &*view.config;
    let copy = |step: Step| config.copy_for(step).clone();

    let page = match route {
        Route::Landing => html! {
            <LandingPage
                couple={config.couple.clone()}
                copy={copy(Step::Landing)}
                on_begin={handlers.begin.clone()}
            />
        },
        Route::Puzzle => html! {
            <PuzzlePage
                couple={config.couple.clone()}
                copy={copy(Step::Puzzle)}
                attempts={state.stats.game_attempts}
                on_solved={handlers.puzzle_solved.clone()}
                on_missed={handlers.puzzle_missed.clone()}
            />
        },
        Route::Message => html! {
            <MessagePage
                couple={config.couple.clone()}
                copy={copy(Step::Message)}
                on_continue={handlers.message_read.clone()}
            />
        },
        Route::Places => html! {
            <PlacesPage
                copy={copy(Step::Places)}
                places={config.places.clone()}
                itinerary={state.itinerary.clone()}
                on_change={handlers.itinerary_change.clone()}
                on_continue={handlers.places_done.clone()}
            />
        },
        Route::Outfits => html! {
            <OutfitsPage
                copy={copy(Step::Outfits)}
                outfits={config.outfits.clone()}
                chosen={state.chosen_outfit_id.clone()}
                on_choose={handlers.outfit_chosen.clone()}
            />
        },
        Route::Summary => html! {
            <SummaryPage
                couple={config.couple.clone()}
                copy={copy(Step::Summary)}
                plan={plan_for(config, state)}
                outfit={state.chosen_outfit_id.as_deref().and_then(|id| config.outfit(id)).cloned()}
                on_reset={handlers.reset.clone()}
            />
        },
        Route::Admin => html! {
            <AdminPage
                config={config.clone()}
                entries={flow.activity().read_all()}
                on_publish={handlers.publish.clone()}
                on_clear_log={handlers.clear_log.clone()}
            />
        },
        Route::NotFound => html! { <NotFound on_go_home={handlers.go_home.clone()} /> },
    };

    let header = route
        .to_step()
        .map(|step| html! { <StepHeader step={step} /> })
        .unwrap_or_default();

    html! {
        <main id="main" role="main" class="giftflow-shell">
            { header }
            { page }
            <MusicToggle
                track={config.music.clone()}
                prefs={state.music.clone()}
                on_change={handlers.music_change.clone()}
            />
        </main>
    }
}
