use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;

use comments::{add_comment, delete_comment, get_comment_tree};
use feed::{get_personal_feed, get_trending_resources};
use follows::{check_follow_status, follow_profile, get_my_follows, unfollow_profile};
use points::{award_points, get_my_point_history, recompute_resource_aggregates};
use profiles::{
    get_my_profile, get_profile, get_profile_resources, recompute_profile_totals, set_ban_status,
    sync_profile, update_my_profile,
};
use resources::{
    delete_resource, download_resource, get_download_stats, get_resource, list_resources,
    upload_resource,
};
use reviews::{get_my_review, get_resource_reviews, submit_review};

mod comments;
mod feed;
mod follows;
mod health_check;
mod points;
mod profiles;
mod resources;
mod reviews;

use crate::routes::health_check::*;

fn resources_routes() -> Scope {
    scope("resources")
        .service(upload_resource)
        .service(list_resources)
        // review routes
        .service(submit_review)
        .service(get_resource_reviews)
        .service(get_my_review)
        // comment routes
        .service(add_comment)
        .service(get_comment_tree)
        .service(delete_comment)
        // download routes
        .service(download_resource)
        .service(get_download_stats)
        .service(get_resource)
        .service(delete_resource)
}

fn profiles_routes() -> Scope {
    scope("profiles")
        .service(sync_profile)
        .service(get_my_profile)
        .service(update_my_profile)
        .service(get_my_follows)
        // follow routes
        .service(follow_profile)
        .service(unfollow_profile)
        .service(check_follow_status)
        .service(get_profile_resources)
        .service(set_ban_status)
        .service(recompute_profile_totals)
        .service(get_profile)
}

fn points_routes() -> Scope {
    scope("points")
        .service(get_my_point_history)
        .service(award_points)
        .service(recompute_resource_aggregates)
}

fn feed_routes() -> Scope {
    scope("")
        .service(get_personal_feed)
        .service(get_trending_resources)
        .service(health_check)
}

pub fn study_vault_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(resources_routes())
            .service(profiles_routes())
            .service(points_routes())
            .service(feed_routes()),
    );
}
