use crate::pages::places::CATEGORIES;
use giftflow_core::{AppState, ContentConfig, CoupleNames, Outfit, Place, StepCopy};
use yew::prelude::*;

/// One resolved stop of the evening.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanStop {
    pub label: AttrValue,
    pub place: Place,
}

/// Resolve the visitor's selections against the current content.
///
/// Selections whose ids no longer exist in the config are skipped. A bare
/// `chosen_place_id` is shown when no itinerary slot is filled.
#[must_use]
pub fn plan_for(config: &ContentConfig, state: &AppState) -> Vec<PlanStop> {
    let slots = [
        state.itinerary.dinner.as_deref(),
        state.itinerary.snack.as_deref(),
        state.itinerary.dessert.as_deref(),
    ];
    let mut stops: Vec<PlanStop> = CATEGORIES
        .iter()
        .zip(slots)
        .filter_map(|(&(_, label), id)| {
            config.place(id?).map(|place| PlanStop {
                label: AttrValue::from(label),
                place: place.clone(),
            })
        })
        .collect();
    if stops.is_empty()
        && let Some(place) = state.chosen_place_id.as_deref().and_then(|id| config.place(id))
    {
        stops.push(PlanStop {
            label: AttrValue::from("Our spot"),
            place: place.clone(),
        });
    }
    stops
}

#[derive(Properties, Clone, PartialEq)]
pub struct SummaryPageProps {
    pub couple: CoupleNames,
    pub copy: StepCopy,
    pub plan: Vec<PlanStop>,
    #[prop_or_default]
    pub outfit: Option<Outfit>,
    pub on_reset: Callback<()>,
}

#[function_component(SummaryPage)]
pub fn summary_page(props: &SummaryPageProps) -> Html {
    let confirming = use_state(|| false);

    let ask = {
        let confirming = confirming.clone();
        Callback::from(move |_| confirming.set(true))
    };
    let cancel = {
        let confirming = confirming.clone();
        Callback::from(move |_| confirming.set(false))
    };
    let confirm = {
        let confirming = confirming.clone();
        let on_reset = props.on_reset.clone();
        Callback::from(move |_| {
            confirming.set(false);
            on_reset.emit(());
        })
    };

    let stops = props
        .plan
        .iter()
        .map(|stop| {
            html! {
                <li key={stop.place.id.clone()}>
                    <span class="label">{ stop.label.clone() }</span>
                    <strong>{ stop.place.name.clone() }</strong>
                    if !stop.place.hours.is_empty() {
                        <span class="hours">{ stop.place.hours.clone() }</span>
                    }
                </li>
            }
        })
        .collect::<Html>();

    html! {
        <section class="panel summary" data-testid="summary-screen">
            <h1>{ props.copy.headline.clone() }</h1>
            <p class="subtitle">{ props.copy.subtitle.clone() }</p>
            <p class="couple">{ format!("{} & {}", props.couple.from, props.couple.to) }</p>
            if props.plan.is_empty() {
                <p class="empty">{ "No stops picked yet." }</p>
            } else {
                <ol class="plan">{ stops }</ol>
            }
            if let Some(outfit) = &props.outfit {
                <p class="outfit">{ format!("Wearing: {}", outfit.name) }</p>
            }
            if *confirming {
                <div class="confirm" role="alertdialog" aria-label="Start over">
                    <p>{ "Start over from the beginning? Your choices will be forgotten." }</p>
                    <button type="button" class="btn btn-danger" onclick={confirm}>{ "Yes, start over" }</button>
                    <button type="button" class="btn" onclick={cancel}>{ "Keep my plan" }</button>
                </div>
            } else {
                <button type="button" class="btn btn-ghost" onclick={ask}>{ "Start over" }</button>
            }
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftflow_core::Itinerary;

    #[test]
    fn plan_follows_serving_order_and_skips_unknown_ids() {
        let config = ContentConfig::default();
        let state = AppState {
            itinerary: Itinerary {
                dinner: Some("ramen-bar".to_string()),
                snack: Some("gone".to_string()),
                dessert: Some("gelateria".to_string()),
            },
            ..AppState::default()
        };
        let plan = plan_for(&config, &state);
        let names: Vec<&str> = plan.iter().map(|s| s.place.id.as_str()).collect();
        assert_eq!(names, vec!["ramen-bar", "gelateria"]);
        assert_eq!(plan[0].label.as_str(), "Dinner");
    }

    #[test]
    fn single_place_choice_is_a_fallback() {
        let config = ContentConfig::default();
        let state = AppState {
            chosen_place_id: Some("trattoria".to_string()),
            ..AppState::default()
        };
        let plan = plan_for(&config, &state);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].place.id, "trattoria");
    }
}
