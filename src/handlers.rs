use crate::auth::{self, AdminSession, AuthError};
use crate::database::*;
use crate::error::{log_error, redirect, AppError};
use crate::flash::{self, Flash};
use crate::model::*;
use crate::validate::*;
use crate::{Db, Tera};
use actix_identity::{Identity, IdentityExt};
use actix_session::Session;
use actix_web::{
    dev::ServiceResponse,
    http::StatusCode,
    middleware::{ErrorHandlerResponse, ErrorHandlers},
    web, HttpMessage, HttpRequest, HttpResponse,
};
use log::info;
use serde::{Deserialize, Serialize};

type HandlerResult = Result<HttpResponse, AppError>;

const HTML: &str = "text/html; charset=utf-8";

fn base_context(db: &sled::Db, logged_in: bool) -> Result<tera::Context, AppError> {
    let mut ctx = tera::Context::new();
    if let Some(admin) = db.get_admin()? {
        ctx.insert("user", &admin.name);
    }
    ctx.insert("logged_in", &logged_in);
    Ok(ctx)
}

/// Variables every template can rely on.
fn page_context(
    db: &sled::Db,
    session: &Session,
    logged_in: bool,
) -> Result<tera::Context, AppError> {
    let mut ctx = base_context(db, logged_in)?;
    ctx.insert("messages", &flash::take(session));
    Ok(ctx)
}

fn render(tera: &tera::Tera, template: &str, ctx: &tera::Context) -> HandlerResult {
    let body = tera
        .render(template, ctx)
        .map_err(|err| log_error(err, "Template error"))?;
    Ok(HttpResponse::Ok().content_type(HTML).body(body))
}

#[derive(Serialize)]
struct MovieView {
    id: u64,
    title: String,
    year: String,
}

#[derive(Deserialize)]
pub struct MovieForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    year: String,
}

impl MovieForm {
    fn into_movie(self) -> Option<Movie> {
        if validate_movie(&self.title, &self.year) {
            Some(Movie::new(self.title, self.year))
        } else {
            None
        }
    }
}

async fn index(
    admin: Option<AdminSession>,
    session: Session,
    tera: Tera,
    db: Db,
) -> HandlerResult {
    let mut ctx = page_context(&db, &session, admin.is_some())?;
    let movies = db
        .list_movies()?
        .into_iter()
        .map(|(id, movie)| MovieView {
            id,
            title: movie.title,
            year: movie.year,
        })
        .collect::<Vec<_>>();
    ctx.insert("movies", &movies);
    render(&tera, "index.html", &ctx)
}

async fn create_movie(
    admin: Option<AdminSession>,
    form: web::Form<MovieForm>,
    session: Session,
    db: Db,
) -> HandlerResult {
    if admin.is_none() {
        return Ok(redirect("/"));
    }
    match form.into_inner().into_movie() {
        Some(movie) => {
            let id = db.add_movie(&movie)?;
            info!("Created movie {}: {:?}", id, movie);
            flash::push(&session, Flash::ItemCreated)?;
        }
        None => flash::push(&session, Flash::InvalidInput)?,
    }
    Ok(redirect("/"))
}

async fn user_page(name: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(HTML)
        .body(format!("User: {}", tera::escape_html(&name)))
}

async fn edit(
    _admin: AdminSession,
    movie_id: web::Path<u64>,
    session: Session,
    tera: Tera,
    db: Db,
) -> HandlerResult {
    let movie_id = movie_id.into_inner();
    let movie = db.get_movie(movie_id)?.ok_or(AppError::NotFound)?;
    let mut ctx = page_context(&db, &session, true)?;
    ctx.insert(
        "movie",
        &MovieView {
            id: movie_id,
            title: movie.title,
            year: movie.year,
        },
    );
    render(&tera, "edit.html", &ctx)
}

async fn edit_post(
    _admin: AdminSession,
    movie_id: web::Path<u64>,
    form: web::Form<MovieForm>,
    session: Session,
    db: Db,
) -> HandlerResult {
    let movie_id = movie_id.into_inner();
    if db.get_movie(movie_id)?.is_none() {
        return Err(AppError::NotFound);
    }
    let movie = match form.into_inner().into_movie() {
        Some(movie) => movie,
        None => {
            flash::push(&session, Flash::InvalidInput)?;
            return Ok(redirect(&format!("/movie/edit/{}", movie_id)));
        }
    };
    db.update_movie(movie_id, &movie)?;
    info!("Updated movie {}: {:?}", movie_id, movie);
    flash::push(&session, Flash::ItemUpdated)?;
    Ok(redirect("/"))
}

async fn delete(
    _admin: AdminSession,
    movie_id: web::Path<u64>,
    session: Session,
    db: Db,
) -> HandlerResult {
    let movie_id = movie_id.into_inner();
    let movie = db.remove_movie(movie_id)?;
    info!("Deleted movie {}: {:?}", movie_id, movie);
    flash::push(&session, Flash::ItemDeleted)?;
    Ok(redirect("/"))
}

async fn login(
    admin: Option<AdminSession>,
    session: Session,
    tera: Tera,
    db: Db,
) -> HandlerResult {
    let ctx = page_context(&db, &session, admin.is_some())?;
    render(&tera, "login.html", &ctx)
}

#[derive(Deserialize)]
pub struct LoginParams {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login_post(
    req: HttpRequest,
    params: web::Form<LoginParams>,
    session: Session,
    db: Db,
) -> HandlerResult {
    if !validate_login(&params.username, &params.password) {
        flash::push(&session, Flash::InvalidInput)?;
        return Ok(redirect("/login"));
    }
    match auth::login(&db, &params.username, &params.password) {
        Ok(admin) => {
            Identity::login(&req.extensions(), admin.username.clone())
                .map_err(|err| log_error(err, "Session error"))?;
            info!("{} logged in", admin.username);
            flash::push(&session, Flash::LoginSuccess)?;
            Ok(redirect("/"))
        }
        Err(AuthError::InvalidCredentials) => {
            flash::push(&session, Flash::InvalidCredentials)?;
            Ok(redirect("/login"))
        }
        Err(AuthError::NotConfigured) => {
            flash::push(&session, Flash::NotConfigured)?;
            Ok(redirect("/login"))
        }
        Err(err) => Err(err.into()),
    }
}

async fn logout(admin: AdminSession, session: Session) -> HandlerResult {
    info!("{} logged out", admin.admin.username);
    admin.logout();
    flash::push(&session, Flash::Goodbye)?;
    Ok(redirect("/"))
}

async fn settings(admin: AdminSession, session: Session, tera: Tera, db: Db) -> HandlerResult {
    let mut ctx = page_context(&db, &session, true)?;
    ctx.insert("name", &admin.admin.name);
    render(&tera, "settings.html", &ctx)
}

#[derive(Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    name: String,
}

async fn settings_post(
    _admin: AdminSession,
    form: web::Form<SettingsForm>,
    session: Session,
    db: Db,
) -> HandlerResult {
    if !validate_name(&form.name) {
        flash::push(&session, Flash::InvalidInput)?;
        return Ok(redirect("/settings"));
    }
    match db.rename_admin(&form.name) {
        Ok(admin) => info!("Display name changed to {:?}", admin.name),
        Err(DbError::NotFound) => return Err(AppError::NotConfigured),
        Err(err) => return Err(err.into()),
    }
    flash::push(&session, Flash::SettingsUpdated)?;
    Ok(redirect("/"))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

fn not_found_page<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (tera, db) = match (
        res.request().app_data::<Tera>().cloned(),
        res.request().app_data::<Db>().cloned(),
    ) {
        (Some(tera), Some(db)) => (tera, db),
        _ => return Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
    };
    // Flash messages stay queued for the next regular page.
    let logged_in = res.request().get_identity().is_ok();
    let ctx = base_context(&db, logged_in)?;
    let body = tera
        .render("404.html", &ctx)
        .map_err(|err| log_error(err, "Template error"))?;
    let (req, _) = res.into_parts();
    let res = ServiceResponse::new(req, HttpResponse::NotFound().content_type(HTML).body(body));
    Ok(ErrorHandlerResponse::Response(res.map_into_right_body()))
}

/// Renders `404.html` for every not found response, whether it comes from
/// an unknown path or a missing movie.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found_page)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/", web::post().to(create_movie))
        .route("/user/{name}", web::get().to(user_page))
        .route("/movie/edit/{movie_id}", web::get().to(edit))
        .route("/movie/edit/{movie_id}", web::post().to(edit_post))
        .route("/movie/delete/{movie_id}", web::post().to(delete))
        .route("/login", web::get().to(login))
        .route("/login", web::post().to(login_post))
        .route("/logout", web::get().to(logout))
        .route("/settings", web::get().to(settings))
        .route("/settings", web::post().to(settings_post))
        .default_service(web::route().to(not_found));
}
