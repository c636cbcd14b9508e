use lazy_static::lazy_static;
use rocket::route::Route;
use rocket::routes;
mod post;
mod user;

lazy_static! {
    pub(crate) static ref USER_ROUTES: Vec<Route> = routes![
        user::create_user,
        user::login_user,
        user::get_all_users,
        user::get_user,
        user::follow_user,
        user::unfollow_user,
    ];
    pub(crate) static ref POST_ROUTES: Vec<Route> = routes![
        post::create_post,
        post::get_user_dashboard,
    ];
}
