//! Who may do what.
//!
//! Every check is a plain predicate over the requesting [`Actor`], the
//! resource and the attempted [`Action`]. Operations combine them and pick
//! the error kind to report.

use crate::{
    error::ApiError,
    types::{Meeting, Participant, Profile, ProfileId, Schedule},
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// The requester as resolved by the authentication middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor {
    pub user: Option<Uuid>,
    pub profile: Option<ProfileId>,
    pub admin: bool,
}

impl Actor {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() || self.admin
    }

    pub fn require_authenticated(&self) -> Result<(), ApiError> {
        match self.is_authenticated() {
            true => Ok(()),
            false => Err(ApiError::NotAuthenticated),
        }
    }

    pub fn require_user(&self) -> Result<Uuid, ApiError> {
        self.user.ok_or(ApiError::NotAuthenticated)
    }

    /// The actor's profile. Authenticated users without one get `NotFound`.
    pub fn require_profile(&self) -> Result<ProfileId, ApiError> {
        self.require_authenticated()?;
        self.profile.ok_or(ApiError::NotFound("Profile"))
    }

    fn is(&self, profile: Option<ProfileId>) -> bool {
        self.profile.is_some() && self.profile == profile
    }
}

pub fn is_author(actor: &Actor, meeting: &Meeting) -> bool {
    actor.is(Some(meeting.author))
}

/// Whether the participant entry belongs to the actor's profile.
pub fn owns_participant(actor: &Actor, participant: &Participant) -> bool {
    actor.is(participant.user)
}

pub fn is_participant(actor: &Actor, participants: &[Participant]) -> bool {
    participants
        .iter()
        .any(|participant| owns_participant(actor, participant))
}

pub fn is_author_or_admin(actor: &Actor, meeting: &Meeting) -> bool {
    is_author(actor, meeting) || actor.admin
}

pub fn may_access_profile(actor: &Actor, profile: &Profile, action: Action) -> bool {
    match action {
        Action::Read | Action::Create => actor.is_authenticated(),
        Action::Update | Action::Delete => actor.is(Some(profile.id)) || actor.admin,
    }
}

/// Schedules are private to their profile for every action.
pub fn may_access_schedule(actor: &Actor, schedule: &Schedule) -> bool {
    actor.is(Some(schedule.profile))
}

pub fn may_access_meeting(actor: &Actor, meeting: &Meeting, action: Action) -> bool {
    match action {
        Action::Read => true,
        Action::Create => actor.profile.is_some(),
        Action::Update | Action::Delete => is_author_or_admin(actor, meeting),
    }
}

pub fn may_access_participant(
    actor: &Actor,
    participant: &Participant,
    meeting: &Meeting,
    action: Action,
) -> bool {
    match action {
        Action::Read | Action::Create => true,
        Action::Update | Action::Delete => {
            owns_participant(actor, participant) || is_author_or_admin(actor, meeting)
        }
    }
}

pub fn may_access_confirmed_time(actor: &Actor, meeting: &Meeting, action: Action) -> bool {
    match action {
        Action::Read => actor.is_authenticated(),
        Action::Create | Action::Update | Action::Delete => is_author_or_admin(actor, meeting),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutils;

    fn member(profile: ProfileId) -> Actor {
        Actor {
            user: Some(Uuid::new_v4()),
            profile: Some(profile),
            admin: false,
        }
    }

    fn admin() -> Actor {
        Actor {
            user: None,
            profile: None,
            admin: true,
        }
    }

    fn guest_participant(user: Option<ProfileId>) -> Participant {
        Participant {
            id: 10,
            meeting: 1,
            user,
            name: "Guest".into(),
            available_times: vec![],
        }
    }

    #[test]
    fn anonymous_actor_is_rejected() {
        let actor = Actor::default();
        assert!(!actor.is_authenticated());
        assert!(matches!(actor.require_user(), Err(ApiError::NotAuthenticated)));
        assert!(matches!(actor.require_profile(), Err(ApiError::NotAuthenticated)));
    }

    #[test]
    fn user_without_profile_is_not_found() {
        let actor = Actor {
            user: Some(Uuid::new_v4()),
            ..Actor::default()
        };
        assert!(matches!(actor.require_profile(), Err(ApiError::NotFound("Profile"))));
    }

    #[test_case::test_case(Action::Read, true, true)]
    #[test_case::test_case(Action::Create, true, false)]
    #[test_case::test_case(Action::Update, true, false)]
    #[test_case::test_case(Action::Delete, true, false)]
    fn meeting_access(action: Action, author_allowed: bool, stranger_allowed: bool) {
        let meeting = testutils::meeting(1, 1);
        let stranger = Actor {
            user: Some(Uuid::new_v4()),
            ..Actor::default()
        };

        assert_eq!(may_access_meeting(&member(1), &meeting, action), author_allowed);
        assert_eq!(may_access_meeting(&stranger, &meeting, action), stranger_allowed);
        if action != Action::Create {
            assert!(may_access_meeting(&admin(), &meeting, action));
        }
    }

    #[test]
    fn anonymous_participant_is_not_owned_by_anonymous_actor() {
        let meeting = testutils::meeting(1, 1);
        let participant = guest_participant(None);

        assert!(!may_access_participant(&Actor::default(), &participant, &meeting, Action::Delete));
        assert!(!may_access_participant(&member(2), &participant, &meeting, Action::Delete));
        assert!(may_access_participant(&member(1), &participant, &meeting, Action::Delete));
    }

    #[test]
    fn participant_may_remove_itself() {
        let meeting = testutils::meeting(1, 1);
        let participant = guest_participant(Some(2));

        assert!(may_access_participant(&member(2), &participant, &meeting, Action::Delete));
        assert!(is_participant(&member(2), &[participant.clone()]));
        assert!(!is_participant(&member(3), &[participant]));
    }

    #[test]
    fn confirmed_times_are_changed_by_author_or_admin() {
        let meeting = testutils::meeting(1, 1);

        assert!(may_access_confirmed_time(&member(2), &meeting, Action::Read));
        assert!(!may_access_confirmed_time(&member(2), &meeting, Action::Update));
        assert!(may_access_confirmed_time(&member(1), &meeting, Action::Update));
        assert!(may_access_confirmed_time(&admin(), &meeting, Action::Delete));
    }

    #[test]
    fn profiles_are_updated_by_owner_or_admin() {
        let profile = testutils::profile(5, "Stefan");

        assert!(may_access_profile(&member(6), &profile, Action::Read));
        assert!(!may_access_profile(&member(6), &profile, Action::Update));
        assert!(may_access_profile(&member(5), &profile, Action::Update));
        assert!(may_access_profile(&admin(), &profile, Action::Update));
    }
}
