#[rocket::launch]
fn rocket() -> _ {
    catalog_server::rocket()
}
