use giftflow_core::{CoupleNames, StepCopy};
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct LandingPageProps {
    pub couple: CoupleNames,
    pub copy: StepCopy,
    pub on_begin: Callback<()>,
}

#[function_component(LandingPage)]
pub fn landing_page(props: &LandingPageProps) -> Html {
    let on_begin = {
        let cb = props.on_begin.clone();
        Callback::from(move |_| cb.emit(()))
    };

    html! {
        <section class="panel landing" data-testid="landing-screen">
            <p class="eyebrow">{ format!("For {}, from {}", props.couple.to, props.couple.from) }</p>
            <h1>{ props.copy.headline.clone() }</h1>
            <p class="subtitle">{ props.copy.subtitle.clone() }</p>
            <button type="button" class="btn btn-primary" onclick={on_begin}>
                { "Begin" }
            </button>
        </section>
    }
}
