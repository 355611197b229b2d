use quiz_core::model::QuestionAttempt;
use services::{Direction, QuestionView, QuizServices, RandomPick, Route};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::render;

enum Step {
    Goto(Route),
    Quit,
}

/// Drive the question pages from stdin until quit, end of input, or the
/// summary page.
pub async fn run(services: &QuizServices, start: Route) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut route = start;
    loop {
        route = match route {
            Route::Entry => services.navigator().start_session(),
            Route::Summary(session) => {
                let report = services.summary().report(&session).await?;
                println!("{}", render::summary(&report));
                let back = services.summary().back_to_questions(&session).await?;
                println!("Back to questions: {back}");
                return Ok(());
            }
            Route::Question(session, number) => {
                let navigator = services.navigator();
                match navigator.load_question(&session, number).await? {
                    QuestionView::NotFound => {
                        println!("Question {number} not found");
                        return Ok(());
                    }
                    QuestionView::Question(attempt) => {
                        match question_page(services, attempt, &mut input).await? {
                            Step::Goto(next) => next,
                            Step::Quit => return Ok(()),
                        }
                    }
                }
            }
        };
    }
}

/// Failed saves print a notice and keep the attempt on screen.
async fn question_page<R>(
    services: &QuizServices,
    mut attempt: QuestionAttempt,
    input: &mut Lines<R>,
) -> Result<Step, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    let navigator = services.navigator();
    let Some(question) = navigator.question(attempt.question_number()) else {
        return Ok(Step::Quit);
    };
    let progress = navigator.progress(attempt.question_number());
    println!("{}", render::question(question, &attempt, &progress));
    println!("{}", render::PLAY_HELP);

    while let Some(line) = input.next_line().await? {
        let command = line.trim();
        if let Ok(choice) = command.parse::<usize>() {
            if choice == 0 || !attempt.toggle_choice(choice - 1) {
                println!("Choice {choice} cannot be selected");
                continue;
            }
            println!("{}", render::question(question, &attempt, &progress));
            continue;
        }

        match command {
            "a" => {
                if !attempt.can_reveal() {
                    println!("Select a choice first");
                    continue;
                }
                match navigator.reveal(&mut attempt).await {
                    Ok(()) => println!("{}", render::question(question, &attempt, &progress)),
                    Err(err) => println!("Could not save: {err}"),
                }
            }
            "n" | "p" => {
                let direction = if command == "n" {
                    Direction::Next
                } else {
                    Direction::Prev
                };
                match navigator.advance(&attempt, direction).await {
                    Ok(Some(route)) => return Ok(Step::Goto(route)),
                    Ok(None) => println!("No question in that direction"),
                    Err(err) => println!("Could not save: {err}"),
                }
            }
            "r" => match navigator.jump_to_random_unanswered(&attempt).await {
                Ok(RandomPick::Question(number)) => {
                    return Ok(Step::Goto(Route::question(attempt.session(), number)));
                }
                Ok(RandomPick::AllAnswered) => println!("All questions have been answered"),
                Err(err) => println!("Could not save: {err}"),
            },
            "s" => match navigator.jump_to_summary(&attempt).await {
                Ok(route) => return Ok(Step::Goto(route)),
                Err(err) => println!("Could not save: {err}"),
            },
            "q" => return Ok(Step::Quit),
            _ => println!("{}", render::PLAY_HELP),
        }
    }
    Ok(Step::Quit)
}
