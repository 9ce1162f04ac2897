//! End-to-end scenarios for the candidate assessment workflow.
//!
//! Scenarios drive the public service facade with explicit timestamps so the
//! test-window rules can be checked without touching the wall clock.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use candidate_assessment::access::{Principal, SessionRegistry};
    use candidate_assessment::assessment::{
        AssessmentService, CodeAnswer, InMemoryAssessmentRepository, NewCandidate, NewProblem,
        TechnologyStack,
    };
    use candidate_assessment::config::AssessmentConfig;

    pub(super) type Service = AssessmentService<InMemoryAssessmentRepository>;

    pub(super) fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, second)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn service() -> Service {
        AssessmentService::new(
            Arc::new(InMemoryAssessmentRepository::default()),
            Arc::new(SessionRegistry::default()),
            AssessmentConfig::default(),
        )
    }

    pub(super) fn admin() -> Principal {
        Principal::admin("staff:Dana", "Dana")
    }

    pub(super) fn problem(stacks: &[&str]) -> NewProblem {
        NewProblem {
            title: "Order book".to_string(),
            statement: "Match buy and sell orders.".to_string(),
            required_stacks: stacks.iter().map(|name| TechnologyStack::new(*name)).collect(),
        }
    }

    pub(super) fn answer(technology: &str) -> CodeAnswer {
        CodeAnswer {
            technology: TechnologyStack::new(technology),
            code: format!("// {technology} solution"),
        }
    }

    pub(super) fn invitation(
        problem_id: &candidate_assessment::assessment::ProblemId,
        email: &str,
        scheduled_time: DateTime<Utc>,
    ) -> NewCandidate {
        NewCandidate {
            name: "Grace Hopper".to_string(),
            email: email.to_string(),
            department: "Platform".to_string(),
            position: "Systems Engineer".to_string(),
            problem_id: problem_id.clone(),
            scheduled_time,
        }
    }
}

use candidate_assessment::assessment::{
    AssessmentError, ConflictError, LifecycleState, RecommendationStatus, ValidationError,
};
use common::*;

#[test]
fn candidate_moves_through_every_state_once() {
    let service = service();
    let problem = service
        .register_problem(&admin(), problem(&["Rust", "TypeScript", "SQL"]))
        .expect("problem registers");
    let invited = service
        .create_candidate(&admin(), invitation(&problem.id, "grace@example.com", at(10, 0, 0)), at(8, 0, 0))
        .expect("candidate invited");

    let expected_end: chrono::DateTime<chrono::Utc> =
        "2024-01-01T14:00:00Z".parse().expect("timestamp");
    assert_eq!(invited.profile.end_time, expected_end);

    let session = service
        .login("grace@example.com", &invited.access_code.0)
        .expect("login");
    let principal = service.authenticate(&session.token).expect("session resolves");

    let view = service.current_candidate(&principal, at(9, 0, 0)).expect("view");
    assert_eq!(view.state, LifecycleState::Locked);
    assert!(matches!(
        service.start_test(&principal, at(9, 30, 0)),
        Err(AssessmentError::Conflict(ConflictError::NotYetOpen { .. }))
    ));
    assert!(matches!(
        service.submit_test(&principal, vec![answer("Rust")], at(9, 30, 0)),
        Err(AssessmentError::Conflict(ConflictError::NotStarted))
    ));

    let view = service.current_candidate(&principal, at(10, 0, 0)).expect("view");
    assert_eq!(view.state, LifecycleState::Startable);

    service.start_test(&principal, at(10, 2, 0)).expect("start");
    assert!(matches!(
        service.start_test(&principal, at(10, 3, 0)),
        Err(AssessmentError::Conflict(ConflictError::AlreadyStarted))
    ));

    assert!(matches!(
        service.submit_test(&principal, vec![answer("Rust"), answer("SQL")], at(11, 0, 0)),
        Err(AssessmentError::Validation(ValidationError::MissingAnswer(_)))
    ));

    let view = service
        .submit_test(
            &principal,
            vec![answer("sql"), answer("typescript"), answer("rust")],
            at(11, 25, 45),
        )
        .expect("submit");
    assert_eq!(view.state, LifecycleState::Submitted);
    assert_eq!(view.start_time, Some(at(10, 2, 0)));
    assert_eq!(
        view.elapsed.map(|elapsed| elapsed.to_string()).as_deref(),
        Some("01:23:45")
    );

    assert!(matches!(
        service.submit_test(
            &principal,
            vec![answer("Rust"), answer("TypeScript"), answer("SQL")],
            at(11, 30, 0)
        ),
        Err(AssessmentError::Conflict(ConflictError::AlreadySubmitted))
    ));

    let submissions = service.list_submissions(&admin()).expect("list");
    assert_eq!(submissions.len(), 1);
    let stacks: Vec<&str> = submissions[0]
        .answers
        .iter()
        .map(|answer| answer.technology.name())
        .collect();
    assert_eq!(stacks, vec!["Rust", "TypeScript", "SQL"]);
}

#[test]
fn reviewers_leave_one_remark_each_and_flag_recommendation() {
    let service = service();
    let problem = service
        .register_problem(&admin(), problem(&["Go"]))
        .expect("problem registers");
    let invited = service
        .create_candidate(&admin(), invitation(&problem.id, "linus@example.com", at(9, 0, 0)), at(8, 0, 0))
        .expect("candidate invited");
    let candidate = candidate_assessment::access::Principal::candidate(&invited.id, "Grace Hopper");
    service.start_test(&candidate, at(9, 0, 0)).expect("start");
    service
        .submit_test(&candidate, vec![answer("Go")], at(10, 0, 0))
        .expect("submit");

    let submission_id = service.list_submissions(&admin()).expect("list")[0]
        .submission_id
        .clone();
    let lee = candidate_assessment::access::Principal::interviewer("staff:Lee", "Lee");
    let kim = candidate_assessment::access::Principal::interviewer("staff:Kim", "Kim");

    assert_eq!(
        service.submission(&lee, &submission_id).expect("view").status,
        RecommendationStatus::Pending
    );
    assert!(matches!(
        service.add_remark(&lee, &submission_id, "", at(11, 0, 0)),
        Err(AssessmentError::Validation(ValidationError::EmptyField(_)))
    ));

    service
        .add_remark(&lee, &submission_id, "Idiomatic error handling.", at(11, 0, 0))
        .expect("lee remarks");
    assert!(matches!(
        service.add_remark(&lee, &submission_id, "Again.", at(11, 1, 0)),
        Err(AssessmentError::Conflict(ConflictError::DuplicateRemark(_)))
    ));
    let view = service
        .add_remark(&kim, &submission_id, "Missing benchmarks.", at(11, 2, 0))
        .expect("kim remarks");
    assert_eq!(view.status, RecommendationStatus::NotRecommended);
    assert_eq!(view.remarks.len(), 2);

    let view = service
        .set_recommendation(&kim, &submission_id, true)
        .expect("flag set");
    assert_eq!(view.status, RecommendationStatus::Recommended);

    assert!(matches!(
        service.set_recommendation(&candidate, &submission_id, false),
        Err(AssessmentError::Forbidden)
    ));
}
