use giftflow_core::Step;
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct StepHeaderProps {
    pub step: Step,
}

/// Progress marker shown above every flow page.
#[function_component(StepHeader)]
pub fn step_header(props: &StepHeaderProps) -> Html {
    let position = u32::from(props.step.index()) + 1;
    let total = Step::ALL.len();
    html! {
        <header class="step-header" aria-label="Progress">
            <span class="step-count">{ format!("Step {position} of {total}") }</span>
            <progress value={position.to_string()} max={total.to_string()}></progress>
        </header>
    }
}
