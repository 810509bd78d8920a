use yew::prelude::*;

/// Shown when the address matches no known route.
#[derive(Properties, PartialEq)]
pub struct Props {
    pub on_go_home: Callback<()>,
}

#[function_component(NotFound)]
pub fn not_found(props: &Props) -> Html {
    let go_home = {
        let cb = props.on_go_home.clone();
        Callback::from(move |_| cb.emit(()))
    };

    html! {
        <section class="panel not-found" aria-live="assertive">
            <h1>{ "Nothing here" }</h1>
            <p>{ "This page doesn't exist, but your surprise does." }</p>
            <button type="button" class="btn" onclick={go_home}>
                { "Back to the start" }
            </button>
        </section>
    }
}
