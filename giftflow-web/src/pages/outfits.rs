use crate::paths::media_url;
use giftflow_core::{Outfit, StepCopy};
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct OutfitsPageProps {
    pub copy: StepCopy,
    pub outfits: Vec<Outfit>,
    #[prop_or_default]
    pub chosen: Option<String>,
    pub on_choose: Callback<String>,
}

fn outfit_card(outfit: &Outfit, chosen: Option<&str>, on_choose: &Callback<String>) -> Html {
    let selected = chosen == Some(outfit.id.as_str());
    let on_pick = {
        let id = outfit.id.clone();
        let cb = on_choose.clone();
        Callback::from(move |_| cb.emit(id.clone()))
    };
    let swatches = outfit
        .palette
        .iter()
        .map(|color| {
            html! {
                <span class="swatch" style={format!("background:{color}")} title={color.clone()}></span>
            }
        })
        .collect::<Html>();

    html! {
        <li class={classes!("outfit-card", selected.then_some("selected"))} key={outfit.id.clone()}>
            if !outfit.image.is_empty() {
                <img src={media_url(&outfit.image)} alt={outfit.name.clone()} loading="lazy" />
            }
            <h3>{ outfit.name.clone() }</h3>
            if !outfit.style.is_empty() {
                <p class="style">{ outfit.style.clone() }</p>
            }
            <p>{ outfit.description.clone() }</p>
            <div class="palette">{ swatches }</div>
            <button type="button" class="btn" aria-pressed={selected.to_string()} onclick={on_pick}>
                { "Wear this" }
            </button>
        </li>
    }
}

#[function_component(OutfitsPage)]
pub fn outfits_page(props: &OutfitsPageProps) -> Html {
    let cards = props
        .outfits
        .iter()
        .map(|outfit| outfit_card(outfit, props.chosen.as_deref(), &props.on_choose))
        .collect::<Html>();

    html! {
        <section class="panel outfits" data-testid="outfits-screen">
            <h1>{ props.copy.headline.clone() }</h1>
            <p class="subtitle">{ props.copy.subtitle.clone() }</p>
            <ul class="outfit-list">{ cards }</ul>
        </section>
    }
}
