use giftflow_core::{CoupleNames, StepCopy};
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct PuzzlePageProps {
    pub couple: CoupleNames,
    pub copy: StepCopy,
    #[prop_or_default]
    pub attempts: u32,
    pub on_solved: Callback<()>,
    pub on_missed: Callback<()>,
}

/// Case-insensitive comparison ignoring surrounding whitespace. Blank guesses
/// never match.
#[must_use]
pub fn answer_matches(attempt: &str, expected: &str) -> bool {
    let attempt = attempt.trim();
    !attempt.is_empty() && attempt.to_lowercase() == expected.trim().to_lowercase()
}

#[function_component(PuzzlePage)]
pub fn puzzle_page(props: &PuzzlePageProps) -> Html {
    let guess = use_state(String::new);
    let missed = use_state(|| false);

    let on_input = {
        let guess = guess.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                guess.set(input.value());
            }
        })
    };

    let on_submit = {
        let guess = guess.clone();
        let missed = missed.clone();
        let expected = props.couple.from.clone();
        let on_solved = props.on_solved.clone();
        let on_missed = props.on_missed.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if answer_matches(&guess, &expected) {
                missed.set(false);
                on_solved.emit(());
            } else {
                missed.set(true);
                on_missed.emit(());
            }
        })
    };

    html! {
        <section class="panel puzzle" data-testid="puzzle-screen">
            <h1>{ props.copy.headline.clone() }</h1>
            <p class="subtitle">{ props.copy.subtitle.clone() }</p>
            <form class="riddle" onsubmit={on_submit}>
                <label for="riddle-answer">{ "Who planned all of this for you?" }</label>
                <input
                    id="riddle-answer"
                    type="text"
                    autocomplete="off"
                    value={(*guess).clone()}
                    oninput={on_input}
                />
                <button type="submit" class="btn btn-primary">{ "Answer" }</button>
            </form>
            if *missed {
                <p class="hint" role="status">{ "Not quite. Think about who sent the link." }</p>
            }
            if props.attempts > 0 {
                <p class="attempts">{ format!("Attempts so far: {}", props.attempts) }</p>
            }
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::answer_matches;

    #[test]
    fn answers_ignore_case_and_padding() {
        assert!(answer_matches("  alex ", "Alex"));
        assert!(answer_matches("ALEX", "alex"));
        assert!(!answer_matches("Sam", "Alex"));
    }

    #[test]
    fn blank_answers_never_match() {
        assert!(!answer_matches("   ", ""));
        assert!(!answer_matches("", "Alex"));
    }
}
