//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AccountService, CourseRepository, CourseService, EnrollmentService, FacultyRepository,
    FacultyService, IdentityRepository, LoginService, Mailer, PasswordHasher, StudentRepository,
    StudentService, TokenService,
};
use crate::domain::{
    AccountManager, AccountPolicy, CapacityMode, CourseCatalogue, CredentialService,
    EnrollmentCoordinator, FacultyDirectory, StudentDirectory,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn AccountService>,
    pub students: Arc<dyn StudentService>,
    pub faculty: Arc<dyn FacultyService>,
    pub courses: Arc<dyn CourseService>,
    pub enrollment: Arc<dyn EnrollmentService>,
}

/// Driven ports the services share, independent of the storage backend.
#[derive(Clone)]
pub struct Collaborators {
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
}

/// The four repositories, one per aggregate.
pub struct Repositories<I, S, F, C> {
    pub identities: Arc<I>,
    pub students: Arc<S>,
    pub faculty: Arc<F>,
    pub courses: Arc<C>,
}

impl HttpState {
    /// Build every domain service over one set of repositories.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use registrar::domain::{AccountPolicy, CapacityMode};
    /// use registrar::inbound::http::state::{Collaborators, HttpState, Repositories};
    /// use registrar::outbound::mail::LoggingMailer;
    /// use registrar::outbound::memory::MemoryStore;
    /// use registrar::outbound::security::{Argon2PasswordHasher, JwtTokenService};
    /// use zeroize::Zeroizing;
    ///
    /// let clock = Arc::new(DefaultClock);
    /// let secret = Zeroizing::new(vec![7_u8; 32]);
    /// let tokens = JwtTokenService::new(&secret, chrono::Duration::hours(1), clock.clone())
    ///     .expect("token service");
    /// let store = Arc::new(MemoryStore::new());
    /// let state = HttpState::assemble(
    ///     Repositories {
    ///         identities: store.clone(),
    ///         students: store.clone(),
    ///         faculty: store.clone(),
    ///         courses: store,
    ///     },
    ///     Collaborators {
    ///         hasher: Arc::new(Argon2PasswordHasher::new()),
    ///         tokens: Arc::new(tokens),
    ///         mailer: Arc::new(LoggingMailer),
    ///         clock,
    ///     },
    ///     AccountPolicy::default(),
    ///     CapacityMode::BestEffort,
    /// );
    /// let _login = state.login.clone();
    /// ```
    pub fn assemble<I, S, F, C>(
        repositories: Repositories<I, S, F, C>,
        collaborators: Collaborators,
        account_policy: AccountPolicy,
        capacity_mode: CapacityMode,
    ) -> Self
    where
        I: IdentityRepository + 'static,
        S: StudentRepository + 'static,
        F: FacultyRepository + 'static,
        C: CourseRepository + 'static,
    {
        let Repositories {
            identities,
            students,
            faculty,
            courses,
        } = repositories;
        let Collaborators {
            hasher,
            tokens,
            mailer,
            clock,
        } = collaborators;

        Self {
            login: Arc::new(CredentialService::new(
                identities.clone(),
                hasher.clone(),
                tokens,
                clock.clone(),
                account_policy,
            )),
            accounts: Arc::new(AccountManager::new(
                identities.clone(),
                hasher.clone(),
                mailer,
                clock.clone(),
                account_policy,
            )),
            students: Arc::new(StudentDirectory::new(
                identities.clone(),
                students.clone(),
                courses.clone(),
                hasher.clone(),
                clock.clone(),
            )),
            faculty: Arc::new(FacultyDirectory::new(
                identities,
                faculty.clone(),
                courses.clone(),
                hasher,
                clock.clone(),
            )),
            courses: Arc::new(CourseCatalogue::new(
                courses.clone(),
                faculty.clone(),
                students.clone(),
                clock.clone(),
                capacity_mode,
            )),
            enrollment: Arc::new(EnrollmentCoordinator::new(
                courses,
                students,
                faculty,
                clock,
                capacity_mode,
            )),
        }
    }
}
