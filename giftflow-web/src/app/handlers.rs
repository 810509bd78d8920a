use crate::app::session::{FlowView, WebFlow};
use crate::router::Route;
use giftflow_core::{ContentConfig, Itinerary, MusicPrefs, Navigation, Step};
use std::rc::Rc;
use yew::prelude::*;
use yew_router::prelude::{Navigator, Routable};

#[derive(Clone)]
pub struct FlowHandlers {
    pub begin: Callback<()>,
    pub puzzle_solved: Callback<()>,
    pub puzzle_missed: Callback<()>,
    pub message_read: Callback<()>,
    pub itinerary_change: Callback<Itinerary>,
    pub places_done: Callback<()>,
    pub outfit_chosen: Callback<String>,
    pub reset: Callback<()>,
    pub publish: Callback<ContentConfig>,
    pub clear_log: Callback<()>,
    pub music_change: Callback<MusicPrefs>,
    pub go_home: Callback<()>,
}

impl FlowHandlers {
    #[must_use]
    pub fn new(flow: &Rc<WebFlow>, view: &FlowView, navigator: Option<Navigator>) -> Self {
        Self {
            begin: advance_to(flow, navigator.clone(), Step::Puzzle),
            puzzle_solved: build_puzzle_solved(flow, navigator.clone()),
            puzzle_missed: build_puzzle_missed(flow),
            message_read: advance_to(flow, navigator.clone(), Step::Places),
            itinerary_change: build_itinerary_change(flow),
            places_done: advance_to(flow, navigator.clone(), Step::Outfits),
            outfit_chosen: build_outfit_chosen(flow, navigator.clone()),
            reset: build_reset(flow, navigator.clone()),
            publish: build_publish(flow, view),
            clear_log: build_clear_log(flow, view),
            music_change: build_music_change(flow),
            go_home: build_go_home(navigator),
        }
    }
}

fn push(navigator: Option<&Navigator>, route: &Route) {
    if let Some(navigator) = navigator {
        navigator.push(route);
    }
}

fn advance_to(flow: &Rc<WebFlow>, navigator: Option<Navigator>, step: Step) -> Callback<()> {
    let flow = Rc::clone(flow);
    Callback::from(move |()| {
        flow.advance(step);
        push(navigator.as_ref(), &Route::from_step(step));
    })
}

fn build_puzzle_solved(flow: &Rc<WebFlow>, navigator: Option<Navigator>) -> Callback<()> {
    let flow = Rc::clone(flow);
    Callback::from(move |()| {
        flow.record_game_attempt();
        flow.unlock();
        push(navigator.as_ref(), &Route::Message);
    })
}

fn build_puzzle_missed(flow: &Rc<WebFlow>) -> Callback<()> {
    let flow = Rc::clone(flow);
    Callback::from(move |()| flow.record_game_attempt())
}

fn build_itinerary_change(flow: &Rc<WebFlow>) -> Callback<Itinerary> {
    let flow = Rc::clone(flow);
    Callback::from(move |itinerary: Itinerary| flow.set_itinerary(itinerary))
}

fn build_outfit_chosen(flow: &Rc<WebFlow>, navigator: Option<Navigator>) -> Callback<String> {
    let flow = Rc::clone(flow);
    Callback::from(move |outfit_id: String| {
        flow.choose_outfit(&outfit_id);
        flow.advance(Step::Summary);
        push(navigator.as_ref(), &Route::Summary);
    })
}

fn build_reset(flow: &Rc<WebFlow>, navigator: Option<Navigator>) -> Callback<()> {
    let flow = Rc::clone(flow);
    Callback::from(move |()| {
        if let Navigation::Replace(target) = flow.reset_progress()
            && let (Some(navigator), Some(route)) = (navigator.as_ref(), Route::recognize(target))
        {
            navigator.replace(&route);
        }
    })
}

fn build_publish(flow: &Rc<WebFlow>, view: &FlowView) -> Callback<ContentConfig> {
    let flow = Rc::clone(flow);
    let view = view.clone();
    Callback::from(move |config: ContentConfig| {
        flow.publish_config(&config);
        view.bump_log();
    })
}

fn build_clear_log(flow: &Rc<WebFlow>, view: &FlowView) -> Callback<()> {
    let flow = Rc::clone(flow);
    let view = view.clone();
    Callback::from(move |()| {
        flow.activity().clear();
        view.bump_log();
    })
}

fn build_music_change(flow: &Rc<WebFlow>) -> Callback<MusicPrefs> {
    let flow = Rc::clone(flow);
    Callback::from(move |prefs: MusicPrefs| flow.set_music(prefs.enabled, prefs.volume))
}

fn build_go_home(navigator: Option<Navigator>) -> Callback<()> {
    Callback::from(move |()| push(navigator.as_ref(), &Route::Landing))
}
