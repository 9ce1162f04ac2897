use crate::infra::{build_service, parse_timestamp, MemoryAssessmentService};
use candidate_assessment::access::Principal;
use candidate_assessment::assessment::{
    CandidateStateView, CodeAnswer, NewCandidate, NewProblem, TechnologyStack,
};
use candidate_assessment::config::{AccessConfig, AssessmentConfig};
use candidate_assessment::error::AppError;
use chrono::{DateTime, Duration, DurationRound, Utc};
use clap::Args;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Scheduled start of the test (RFC 3339). Defaults to the top of the current hour.
    #[arg(long, value_parser = crate::infra::parse_timestamp)]
    pub(crate) scheduled: Option<DateTime<Utc>>,
    /// Minutes the candidate spends between starting and submitting.
    #[arg(long, default_value_t = 83)]
    pub(crate) minutes_taken: i64,
    /// Technology stacks the demo problem requires, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "Rust,SQL")]
    pub(crate) stacks: Vec<String>,
    /// Stop after the submission and skip the review portion.
    #[arg(long)]
    pub(crate) skip_review: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        scheduled,
        minutes_taken,
        stacks,
        skip_review,
    } = args;

    let scheduled = match scheduled {
        Some(scheduled) => scheduled,
        None => top_of_hour(Utc::now()),
    };
    let service = build_service(AssessmentConfig::default(), &AccessConfig::default());
    let admin = Principal::admin("staff:demo-admin", "Demo Admin");

    println!("Candidate assessment demo");
    let problem = service.register_problem(
        &admin,
        NewProblem {
            title: "Inventory ledger".to_string(),
            statement: "Record stock movements and report per-SKU balances.".to_string(),
            required_stacks: stacks.iter().map(TechnologyStack::new).collect(),
        },
    )?;
    let stack_names: Vec<&str> = problem
        .required_stacks
        .iter()
        .map(TechnologyStack::name)
        .collect();
    println!(
        "- Problem {} '{}' requires {}",
        problem.id.0,
        problem.title,
        stack_names.join(", ")
    );

    let invited = service.create_candidate(
        &admin,
        NewCandidate {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            department: "Engineering".to_string(),
            position: "Backend Engineer".to_string(),
            problem_id: problem.id.clone(),
            scheduled_time: scheduled,
        },
        scheduled - Duration::days(1),
    )?;
    println!(
        "- Invited {} <{}> with access code {}",
        invited.profile.name, invited.profile.email, invited.access_code.0
    );
    println!(
        "  Window: {} -> {}",
        invited.profile.scheduled_time, invited.profile.end_time
    );

    let session = service.login(&invited.profile.email, &invited.access_code.0)?;
    let candidate = service.authenticate(&session.token)?;

    let early = scheduled - Duration::minutes(5);
    render_state("Five minutes early", &service.current_candidate(&candidate, early)?);
    if let Err(err) = service.start_test(&candidate, early) {
        println!("  Early start refused: {err}");
    }

    let started = service.start_test(&candidate, scheduled)?;
    render_state("Started", &started);
    if let Err(err) = service.start_test(&candidate, scheduled + Duration::minutes(1)) {
        println!("  Second start refused: {err}");
    }

    let finished_at = scheduled + Duration::minutes(minutes_taken.max(0));
    let answers: Vec<CodeAnswer> = problem
        .required_stacks
        .iter()
        .map(|stack| CodeAnswer {
            technology: stack.clone(),
            code: format!("// {} solution", stack.name()),
        })
        .collect();
    let submitted = service.submit_test(&candidate, answers, finished_at)?;
    render_state("Submitted", &submitted);

    if skip_review {
        return Ok(());
    }

    review_demo(&service, finished_at)
}

fn review_demo(service: &MemoryAssessmentService, submitted_at: DateTime<Utc>) -> Result<(), AppError> {
    println!("\nReview");
    let admin = Principal::admin("staff:demo-admin", "Demo Admin");
    let lee = Principal::interviewer("staff:lee", "Lee");
    let kim = Principal::interviewer("staff:kim", "Kim");

    let Some(submission) = service.list_submissions(&admin)?.into_iter().next() else {
        println!("- No submissions recorded");
        return Ok(());
    };
    let id = submission.submission_id;
    println!("- Submission {} status {}", id.0, submission.status.label());

    let reviewed = service.add_remark(
        &lee,
        &id,
        "Clear module boundaries; error paths untested.",
        submitted_at + Duration::hours(2),
    )?;
    println!("- Lee remarked -> status {}", reviewed.status.label());

    if let Err(err) = service.add_remark(&lee, &id, "One more thing.", submitted_at + Duration::hours(3)) {
        println!("  Second remark from Lee refused: {err}");
    }

    service.add_remark(
        &kim,
        &id,
        "Good SQL; would pair on the Rust side.",
        submitted_at + Duration::hours(4),
    )?;
    let recommended = service.set_recommendation(&kim, &id, true)?;
    println!(
        "- Kim remarked and recommended -> status {} ({} remarks)",
        recommended.status.label(),
        recommended.remarks.len()
    );

    match serde_json::to_string_pretty(&recommended) {
        Ok(json) => println!("  Submission payload:\n{}", json),
        Err(err) => println!("  Submission payload unavailable: {}", err),
    }

    Ok(())
}

fn render_state(heading: &str, view: &CandidateStateView) {
    println!("- {}: state {}", heading, view.state.label());
    if let Some(elapsed) = view.elapsed {
        println!("  Elapsed: {elapsed}");
    }
    if view.window_closed {
        println!("  Window closed at {}", view.end_time);
    }
}

fn top_of_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(Duration::hours(1)).unwrap_or(now)
}
