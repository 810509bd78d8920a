use crate::paths::media_url;
use giftflow_core::{Itinerary, Place, StepCopy};
use yew::prelude::*;

/// Itinerary slots in serving order: tag and display label.
pub const CATEGORIES: [(&str, &str); 3] = [("dinner", "Dinner"), ("snack", "Snack"), ("dessert", "Dessert")];

#[derive(Properties, Clone, PartialEq)]
pub struct PlacesPageProps {
    pub copy: StepCopy,
    pub places: Vec<Place>,
    pub itinerary: Itinerary,
    pub on_change: Callback<Itinerary>,
    pub on_continue: Callback<()>,
}

#[must_use]
pub fn chosen_for<'a>(itinerary: &'a Itinerary, category: &str) -> Option<&'a str> {
    match category {
        "dinner" => itinerary.dinner.as_deref(),
        "snack" => itinerary.snack.as_deref(),
        "dessert" => itinerary.dessert.as_deref(),
        _ => None,
    }
}

/// Toggle `place_id` in the slot for `category`: picking the current choice
/// again clears the slot.
#[must_use]
pub fn with_choice(itinerary: &Itinerary, category: &str, place_id: &str) -> Itinerary {
    let mut next = itinerary.clone();
    let slot = match category {
        "dinner" => &mut next.dinner,
        "snack" => &mut next.snack,
        "dessert" => &mut next.dessert,
        _ => return next,
    };
    *slot = if slot.as_deref() == Some(place_id) {
        None
    } else {
        Some(place_id.to_string())
    };
    next
}

fn place_card(place: &Place, category: &'static str, props: &PlacesPageProps) -> Html {
    let selected = chosen_for(&props.itinerary, category) == Some(place.id.as_str());
    let on_pick = {
        let itinerary = props.itinerary.clone();
        let place_id = place.id.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |_| on_change.emit(with_choice(&itinerary, category, &place_id)))
    };
    let class = classes!("place-card", selected.then_some("selected"));

    html! {
        <li class={class} key={format!("{category}-{}", place.id)}>
            if !place.image.is_empty() {
                <img src={media_url(&place.image)} alt={place.name.clone()} loading="lazy" />
            }
            <h3>{ place.name.clone() }</h3>
            <p>{ place.description.clone() }</p>
            <p class="meta">
                if !place.budget.is_empty() {
                    <span class="budget">{ place.budget.clone() }</span>
                }
                if !place.hours.is_empty() {
                    <span class="hours">{ place.hours.clone() }</span>
                }
            </p>
            if let Some(pros) = &place.pros {
                <p class="pros">{ pros.clone() }</p>
            }
            if let Some(cons) = &place.cons {
                <p class="cons">{ cons.clone() }</p>
            }
            if !place.link_url.is_empty() {
                <a href={place.link_url.clone()} target="_blank" rel="noopener">{ "Have a look" }</a>
            }
            <button type="button" class="btn" aria-pressed={selected.to_string()} onclick={on_pick}>
                { if selected { "Chosen" } else { "Pick this" } }
            </button>
        </li>
    }
}

#[function_component(PlacesPage)]
pub fn places_page(props: &PlacesPageProps) -> Html {
    let on_continue = {
        let cb = props.on_continue.clone();
        Callback::from(move |_| cb.emit(()))
    };

    let sections = CATEGORIES
        .iter()
        .map(|&(category, label)| {
            let cards = props
                .places
                .iter()
                .filter(|place| place.has_tag(category))
                .map(|place| place_card(place, category, props))
                .collect::<Html>();
            html! {
                <section class="category" key={category}>
                    <h2>{ label }</h2>
                    <ul class="place-list">{ cards }</ul>
                </section>
            }
        })
        .collect::<Html>();

    html! {
        <section class="panel places" data-testid="places-screen">
            <h1>{ props.copy.headline.clone() }</h1>
            <p class="subtitle">{ props.copy.subtitle.clone() }</p>
            { sections }
            <button
                type="button"
                class="btn btn-primary"
                disabled={props.itinerary.is_empty()}
                onclick={on_continue}
            >
                { "On to the outfit" }
            </button>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choosing_fills_then_clears_a_slot() {
        let picked = with_choice(&Itinerary::default(), "dessert", "gelateria");
        assert_eq!(picked.dessert.as_deref(), Some("gelateria"));
        let swapped = with_choice(&picked, "dessert", "patisserie");
        assert_eq!(swapped.dessert.as_deref(), Some("patisserie"));
        let cleared = with_choice(&swapped, "dessert", "patisserie");
        assert!(cleared.is_empty());
    }

    #[test]
    fn unknown_categories_are_ignored() {
        let itinerary = with_choice(&Itinerary::default(), "brunch", "x");
        assert!(itinerary.is_empty());
        assert_eq!(chosen_for(&itinerary, "brunch"), None);
    }
}
