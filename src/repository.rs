use crate::models::{
    Club, ClubStats, CreateClubRequest, CreateEventRequest, Event, EventStats, EventStatus, Role,
    UpdateClubRequest, UpdateEventRequest, User, UserChanges,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// EventQuery
///
/// Visibility-aware listing filter computed by the events handler. `statuses`
/// is the caller's role-wide allowed set (already narrowed by any requested
/// status filter); `manager_id`/`managed_statuses` extend the result with the
/// caller's own clubs' events when they are a club manager.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub statuses: Vec<EventStatus>,
    pub club_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub managed_statuses: Vec<EventStatus>,
    pub skip: i64,
    pub limit: i64,
}

/// NewUser
///
/// Repository-facing creation record: the registration payload with the
/// plaintext password already replaced by its hash.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub student_id: i64,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
    pub wants_email_notif: bool,
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations over the five
/// relations (users, clubs, events, club_memberships, event_attendance). This
/// is the core of the Repository Abstraction pattern, allowing handlers to
/// interact with the data layer without knowing the specific implementation
/// (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's async task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Returns None on a unique-key conflict (duplicate email/student id).
    async fn create_user(&self, user: NewUser) -> Option<User>;
    async fn get_user(&self, id: i64) -> Option<User>;
    async fn get_user_by_email(&self, email: &str) -> Option<User>;
    async fn get_user_by_student_id(&self, student_id: i64) -> Option<User>;
    // Admin access: every registered user.
    async fn list_users(&self) -> Vec<User>;
    // Partial update: only supplied fields change (COALESCE semantics).
    async fn update_user(&self, id: i64, changes: UserChanges) -> Option<User>;
    async fn delete_user(&self, id: i64) -> bool;
    async fn count_users(&self) -> i64;

    // --- Clubs ---
    async fn create_club(&self, req: CreateClubRequest) -> Option<Club>;
    async fn list_clubs(&self, active_only: bool, skip: i64, limit: i64) -> Vec<Club>;
    async fn get_club(&self, id: i64) -> Option<Club>;
    async fn update_club(&self, id: i64, req: UpdateClubRequest) -> Option<Club>;
    // Removes membership rows, the club's events and their attendance rows,
    // then the club itself. Join-table cleanup is explicit, not a schema cascade.
    async fn delete_club(&self, id: i64) -> bool;
    async fn club_members(&self, club_id: i64) -> Vec<User>;
    async fn club_stats(&self, club_id: i64) -> ClubStats;

    // --- Memberships ---
    // Idempotent insert: returns true only if a new row was inserted. The
    // composite primary key is the authoritative duplicate guard.
    async fn add_membership(&self, club_id: i64, user_id: i64) -> bool;
    async fn remove_membership(&self, club_id: i64, user_id: i64) -> bool;
    async fn is_member(&self, club_id: i64, user_id: i64) -> bool;

    // --- Events ---
    async fn create_event(&self, req: CreateEventRequest, status: EventStatus) -> Option<Event>;
    async fn list_events(&self, query: EventQuery) -> Vec<Event>;
    async fn get_event(&self, id: i64) -> Option<Event>;
    async fn update_event(&self, id: i64, req: UpdateEventRequest) -> Option<Event>;
    async fn delete_event(&self, id: i64) -> bool;
    // Lifecycle transitions land here after the state machine has validated them.
    async fn set_event_status(&self, id: i64, status: EventStatus) -> Option<Event>;
    async fn event_stats(&self, event_id: i64) -> EventStats;

    // --- Attendance ---
    async fn add_attendance(&self, event_id: i64, user_id: i64) -> bool;
    async fn remove_attendance(&self, event_id: i64, user_id: i64) -> bool;
    async fn event_attendees(&self, event_id: i64) -> Vec<User>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str, id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("count query error: {:?}", e);
                0
            })
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// create_user
    ///
    /// Inserts a new user. `ON CONFLICT DO NOTHING` turns a duplicate email or
    /// student id into a `None` return instead of a database error.
    async fn create_user(&self, user: NewUser) -> Option<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (student_id, name, email, hashed_password, role, wants_email_notif)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user.student_id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.hashed_password)
        .bind(user.role)
        .bind(user.wants_email_notif)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_user error: {:?}", e);
            None
        })
    }

    async fn get_user(&self, id: i64) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user_by_email error: {:?}", e);
                None
            })
    }

    async fn get_user_by_student_id(&self, student_id: i64) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE student_id = $1")
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user_by_student_id error: {:?}", e);
                None
            })
    }

    async fn list_users(&self) -> Vec<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            })
    }

    /// update_user
    ///
    /// Uses the PostgreSQL `COALESCE` function to handle `Option<T>` fields,
    /// only updating a column if the corresponding field is `Some`.
    async fn update_user(&self, id: i64, changes: UserChanges) -> Option<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET student_id = COALESCE($2, student_id),
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                role = COALESCE($5, role),
                wants_email_notif = COALESCE($6, wants_email_notif),
                hashed_password = COALESCE($7, hashed_password),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.student_id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.role)
        .bind(changes.wants_email_notif)
        .bind(changes.hashed_password)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_user error: {:?}", e);
            None
        })
    }

    /// delete_user
    ///
    /// Clears the user's join-table rows and manager pointers before removing
    /// the row itself, all within one transaction.
    async fn delete_user(&self, id: i64) -> bool {
        let result: Result<bool, sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM event_attendance WHERE user_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM club_memberships WHERE user_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE clubs SET manager_id = NULL WHERE manager_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(deleted.rows_affected() > 0)
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!("delete_user error: {:?}", e);
            false
        })
    }

    async fn count_users(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("count_users error: {:?}", e);
                0
            })
    }

    /// create_club
    ///
    /// Inserts a new club. Branding color and active flag fall back to their
    /// schema defaults when not supplied.
    async fn create_club(&self, req: CreateClubRequest) -> Option<Club> {
        sqlx::query_as::<_, Club>(
            r#"
            INSERT INTO clubs (name, description, image_url, color_code, is_active, manager_id)
            VALUES ($1, $2, $3, COALESCE($4, '#103105'), COALESCE($5, TRUE), $6)
            RETURNING *
            "#,
        )
        .bind(req.name)
        .bind(req.description)
        .bind(req.image_url)
        .bind(req.color_code)
        .bind(req.is_active)
        .bind(req.manager_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_club error: {:?}", e);
            None
        })
    }

    /// list_clubs
    ///
    /// Flexible paged listing using QueryBuilder for safe parameterization.
    async fn list_clubs(&self, active_only: bool, skip: i64, limit: i64) -> Vec<Club> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new("SELECT * FROM clubs ");

        if active_only {
            builder.push(" WHERE is_active = TRUE ");
        }

        builder.push(" ORDER BY id ASC OFFSET ");
        builder.push_bind(skip);
        builder.push(" LIMIT ");
        builder.push_bind(limit);

        builder
            .build_query_as::<Club>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_clubs error: {:?}", e);
                vec![]
            })
    }

    async fn get_club(&self, id: i64) -> Option<Club> {
        sqlx::query_as::<_, Club>("SELECT * FROM clubs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_club error: {:?}", e);
                None
            })
    }

    async fn update_club(&self, id: i64, req: UpdateClubRequest) -> Option<Club> {
        sqlx::query_as::<_, Club>(
            r#"
            UPDATE clubs
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                image_url = COALESCE($4, image_url),
                color_code = COALESCE($5, color_code),
                is_active = COALESCE($6, is_active),
                manager_id = COALESCE($7, manager_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.name)
        .bind(req.description)
        .bind(req.image_url)
        .bind(req.color_code)
        .bind(req.is_active)
        .bind(req.manager_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_club error: {:?}", e);
            None
        })
    }

    /// delete_club
    ///
    /// Join-table cleanup happens with explicit statements in one transaction:
    /// attendance rows for the club's events, the events, the membership rows,
    /// then the club.
    async fn delete_club(&self, id: i64) -> bool {
        let result: Result<bool, sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query(
                "DELETE FROM event_attendance WHERE event_id IN (SELECT id FROM events WHERE club_id = $1)",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
            sqlx::query("DELETE FROM events WHERE club_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM club_memberships WHERE club_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            let deleted = sqlx::query("DELETE FROM clubs WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(deleted.rows_affected() > 0)
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!("delete_club error: {:?}", e);
            false
        })
    }

    async fn club_members(&self, club_id: i64) -> Vec<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN club_memberships m ON m.user_id = u.id
            WHERE m.club_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(club_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("club_members error: {:?}", e);
            vec![]
        })
    }

    /// club_stats
    ///
    /// Compiles the club counters; the average-attendance division is guarded
    /// in `ClubStats::from_counts`.
    async fn club_stats(&self, club_id: i64) -> ClubStats {
        let event_count = self
            .count("SELECT COUNT(*) FROM events WHERE club_id = $1", club_id)
            .await;
        let member_count = self
            .count(
                "SELECT COUNT(*) FROM club_memberships WHERE club_id = $1",
                club_id,
            )
            .await;
        let total_attendance = self
            .count(
                r#"
                SELECT COUNT(*) FROM event_attendance a
                JOIN events e ON e.id = a.event_id
                WHERE e.club_id = $1
                "#,
                club_id,
            )
            .await;
        ClubStats::from_counts(event_count, member_count, total_attendance)
    }

    /// add_membership
    ///
    /// `ON CONFLICT DO NOTHING` makes the insert idempotent: the composite
    /// primary key on (club_id, user_id) rejects the second writer even when
    /// two requests race past the handler's existence check.
    async fn add_membership(&self, club_id: i64, user_id: i64) -> bool {
        let result =
            sqlx::query("INSERT INTO club_memberships (club_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(club_id)
                .bind(user_id)
                .execute(&self.pool)
                .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("add_membership error: {:?}", e);
                false
            }
        }
    }

    async fn remove_membership(&self, club_id: i64, user_id: i64) -> bool {
        match sqlx::query("DELETE FROM club_memberships WHERE club_id = $1 AND user_id = $2")
            .bind(club_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("remove_membership error: {:?}", e);
                false
            }
        }
    }

    async fn is_member(&self, club_id: i64, user_id: i64) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM club_memberships WHERE club_id = $1 AND user_id = $2)",
        )
        .bind(club_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("is_member error: {:?}", e);
            false
        })
    }

    async fn create_event(&self, req: CreateEventRequest, status: EventStatus) -> Option<Event> {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (club_id, name, description, location, status, image_url, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(req.club_id)
        .bind(req.name)
        .bind(req.description)
        .bind(req.location)
        .bind(status)
        .bind(req.image_url)
        .bind(req.start_time)
        .bind(req.end_time)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_event error: {:?}", e);
            None
        })
    }

    /// list_events
    ///
    /// Visibility-aware listing. The base predicate admits the caller's
    /// role-wide status set; a club manager's own clubs additionally
    /// contribute events in the managed set (IDEATION included).
    async fn list_events(&self, query: EventQuery) -> Vec<Event> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT e.* FROM events e JOIN clubs c ON c.id = e.club_id WHERE (e.status = ANY(",
        );
        builder.push_bind(query.statuses);
        builder.push(")");

        if let Some(manager_id) = query.manager_id {
            builder.push(" OR (c.manager_id = ");
            builder.push_bind(manager_id);
            builder.push(" AND e.status = ANY(");
            builder.push_bind(query.managed_statuses);
            builder.push("))");
        }
        builder.push(")");

        if let Some(club_id) = query.club_id {
            builder.push(" AND e.club_id = ");
            builder.push_bind(club_id);
        }

        builder.push(" ORDER BY e.id ASC OFFSET ");
        builder.push_bind(query.skip);
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);

        builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_events error: {:?}", e);
                vec![]
            })
    }

    async fn get_event(&self, id: i64) -> Option<Event> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_event error: {:?}", e);
                None
            })
    }

    async fn update_event(&self, id: i64, req: UpdateEventRequest) -> Option<Event> {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                image_url = COALESCE($5, image_url),
                start_time = COALESCE($6, start_time),
                end_time = COALESCE($7, end_time),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.name)
        .bind(req.description)
        .bind(req.location)
        .bind(req.image_url)
        .bind(req.start_time)
        .bind(req.end_time)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_event error: {:?}", e);
            None
        })
    }

    /// delete_event
    ///
    /// Attendance rows are removed explicitly before the event row, in one
    /// transaction.
    async fn delete_event(&self, id: i64) -> bool {
        let result: Result<bool, sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM event_attendance WHERE event_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            let deleted = sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(deleted.rows_affected() > 0)
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!("delete_event error: {:?}", e);
            false
        })
    }

    async fn set_event_status(&self, id: i64, status: EventStatus) -> Option<Event> {
        sqlx::query_as::<_, Event>(
            "UPDATE events SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_event_status error: {:?}", e);
            None
        })
    }

    /// event_stats
    ///
    /// Gathers the raw counters; every ratio is guarded against a zero divisor
    /// in `EventStats::from_counts`.
    async fn event_stats(&self, event_id: i64) -> EventStats {
        let total_attendance = self
            .count(
                "SELECT COUNT(*) FROM event_attendance WHERE event_id = $1",
                event_id,
            )
            .await;
        let total_users = self.count_users().await;
        let member_attendees = self
            .count(
                r#"
                SELECT COUNT(*) FROM event_attendance a
                JOIN events e ON e.id = a.event_id
                JOIN club_memberships m ON m.club_id = e.club_id AND m.user_id = a.user_id
                WHERE a.event_id = $1
                "#,
                event_id,
            )
            .await;
        let total_club_members = self
            .count(
                r#"
                SELECT COUNT(*) FROM club_memberships m
                JOIN events e ON e.club_id = m.club_id
                WHERE e.id = $1
                "#,
                event_id,
            )
            .await;
        EventStats::from_counts(
            total_attendance,
            total_users,
            member_attendees,
            total_club_members,
        )
    }

    /// add_attendance
    ///
    /// Same idempotency shape as membership: the composite key on
    /// (event_id, user_id) is the backstop against duplicate registration.
    async fn add_attendance(&self, event_id: i64, user_id: i64) -> bool {
        let result =
            sqlx::query("INSERT INTO event_attendance (event_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(event_id)
                .bind(user_id)
                .execute(&self.pool)
                .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("add_attendance error: {:?}", e);
                false
            }
        }
    }

    async fn remove_attendance(&self, event_id: i64, user_id: i64) -> bool {
        match sqlx::query("DELETE FROM event_attendance WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("remove_attendance error: {:?}", e);
                false
            }
        }
    }

    async fn event_attendees(&self, event_id: i64) -> Vec<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN event_attendance a ON a.user_id = u.id
            WHERE a.event_id = $1
            ORDER BY a.recorded_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("event_attendees error: {:?}", e);
            vec![]
        })
    }
}
