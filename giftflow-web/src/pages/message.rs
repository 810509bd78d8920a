use giftflow_core::{CoupleNames, StepCopy};
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct MessagePageProps {
    pub couple: CoupleNames,
    pub copy: StepCopy,
    pub on_continue: Callback<()>,
}

#[function_component(MessagePage)]
pub fn message_page(props: &MessagePageProps) -> Html {
    let on_continue = {
        let cb = props.on_continue.clone();
        Callback::from(move |_| cb.emit(()))
    };

    html! {
        <section class="panel message" data-testid="message-screen">
            <h1>{ props.copy.headline.clone() }</h1>
            <article class="letter">
                <p class="salutation">{ format!("Dear {},", props.couple.to) }</p>
                <p>{ props.copy.subtitle.clone() }</p>
                <p class="signature">{ format!("Love, {}", props.couple.from) }</p>
            </article>
            <button type="button" class="btn btn-primary" onclick={on_continue}>
                { "Where are we going?" }
            </button>
        </section>
    }
}
