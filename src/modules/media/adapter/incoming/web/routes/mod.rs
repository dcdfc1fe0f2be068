pub mod albums;
pub mod files;
pub mod health;
pub mod shares;
pub mod storage;

use actix_web::web::ServiceConfig;

/// Registers every handler. Called once from `main`.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(health::health_handler)
        .service(health::ready_handler)
        .service(files::upload_file_handler)
        .service(files::get_file_handler)
        .service(files::download_file_handler)
        .service(files::list_files_handler)
        .service(files::delete_file_handler)
        .service(files::restore_file_handler)
        .service(shares::create_share_handler)
        .service(shares::resolve_share_handler)
        .service(shares::revoke_share_handler)
        .service(shares::list_shares_for_file_handler)
        .service(albums::create_album_handler)
        .service(albums::get_album_handler)
        .service(albums::list_albums_handler)
        .service(albums::rename_album_handler)
        .service(albums::delete_album_handler)
        .service(albums::add_file_to_album_handler)
        .service(albums::remove_file_from_album_handler)
        .service(albums::list_album_files_handler)
        .service(storage::get_storage_stats_handler);
}
