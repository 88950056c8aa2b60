/// Integration tests for the staff listings of blogs, comments and users
#[macro_use]
mod common;

use actix_web::cookie::Cookie;
use actix_web::test;
use blog_service::db::user_repo;
use common::*;
use serde_json::Value;
use serial_test::serial;

async fn staff_page<S, B>(app: &S, cookie: &Cookie<'static>, uri: &str) -> (String, Value)
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .cookie(cookie.clone())
        .to_request();
    page(test::call_service(app, req).await).await
}

fn column(context: &Value, key: &str) -> Vec<String> {
    context["page_obj"]["object_list"]
        .as_array()
        .expect("object_list")
        .iter()
        .map(|row| row[key].as_str().unwrap_or_default().to_string())
        .collect()
}

#[actix_web::test]
#[serial]
async fn staff_pages_need_the_staff_flag() {
    let ctx = TestContext::start().await;
    let app = init_app!(ctx);
    let alice = signed_in(&app, "alice").await;

    for uri in ["/admin/blogs", "/admin/comments", "/admin/users"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(location(&resp).as_deref(), Some("/login"), "{uri} anonymous");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(uri).cookie(alice.clone()).to_request(),
        )
        .await;
        assert_eq!(location(&resp).as_deref(), Some("/"), "{uri} non-staff");
    }

    grant_staff(&ctx.pool, "alice").await;
    let (template, context) = staff_page(&app, &alice, "/admin/blogs").await;
    assert_eq!(template, "admin_blogs");
    assert_eq!(context["staff"], "alice");
}

#[actix_web::test]
#[serial]
async fn blog_listing_filters_by_author_and_searches_title_or_author() {
    let ctx = TestContext::start().await;
    let app = init_app!(ctx);
    let alice = signed_in(&app, "alice").await;
    let bob = signed_in(&app, "bob").await;
    grant_staff(&ctx.pool, "alice").await;

    create_blog(&app, &alice, "Rust tips", "a").await;
    create_blog(&app, &bob, "Gardening", "b").await;
    create_blog(&app, &alice, "Travel notes", "c").await;

    let (_, context) = staff_page(&app, &alice, "/admin/blogs").await;
    assert_eq!(titles(&context), ["Travel notes", "Gardening", "Rust tips"]);
    assert_eq!(column(&context, "author"), ["alice", "bob", "alice"]);
    assert_eq!(context["page_obj"]["count"], 3);
    let authors: Vec<&str> = context["authors"]
        .as_array()
        .expect("authors")
        .iter()
        .filter_map(|a| a["username"].as_str())
        .collect();
    assert_eq!(authors, ["alice", "bob"]);

    let bob_id = user_repo::find_by_username(&ctx.pool, "bob")
        .await
        .expect("query user")
        .expect("user exists")
        .id;
    let (_, context) = staff_page(&app, &alice, &format!("/admin/blogs?author={}", bob_id)).await;
    assert_eq!(titles(&context), ["Gardening"]);
    assert_eq!(context["author"], bob_id);

    // Title or author username
    let (_, context) = staff_page(&app, &alice, "/admin/blogs?q=BOB").await;
    assert_eq!(titles(&context), ["Gardening"]);
    let (_, context) = staff_page(&app, &alice, "/admin/blogs?q=rust").await;
    assert_eq!(titles(&context), ["Rust tips"]);

    // Unparsable author lists everything
    let (_, context) = staff_page(&app, &alice, "/admin/blogs?author=x").await;
    assert_eq!(titles(&context).len(), 3);
    assert!(context["author"].is_null());
}

#[actix_web::test]
#[serial]
async fn comment_listing_searches_blog_author_and_text() {
    let ctx = TestContext::start().await;
    let app = init_app!(ctx);
    let alice = signed_in(&app, "alice").await;
    let bob = signed_in(&app, "bob").await;
    grant_staff(&ctx.pool, "alice").await;

    create_blog(&app, &alice, "Sourdough", "Bread").await;
    create_blog(&app, &alice, "Compost", "Soil").await;
    let sourdough = blog_id_by_title(&ctx.pool, "Sourdough").await;
    let compost = blog_id_by_title(&ctx.pool, "Compost").await;

    for (cookie, blog, text) in [
        (&bob, sourdough, "Needs more salt"),
        (&alice, compost, "Worms help"),
        (&bob, compost, "What about coffee grounds?"),
    ] {
        test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/blog/{}/comment", blog))
                .cookie(cookie.clone())
                .set_form([("text", text)])
                .to_request(),
        )
        .await;
    }

    let (template, context) = staff_page(&app, &alice, "/admin/comments").await;
    assert_eq!(template, "admin_comments");
    assert_eq!(
        column(&context, "text"),
        ["What about coffee grounds?", "Worms help", "Needs more salt"]
    );
    assert_eq!(
        column(&context, "blog_title"),
        ["Compost", "Compost", "Sourdough"]
    );

    let (_, context) = staff_page(&app, &alice, "/admin/comments?q=sourdough").await;
    assert_eq!(column(&context, "text"), ["Needs more salt"]);

    let (_, context) = staff_page(&app, &alice, "/admin/comments?q=bob").await;
    assert_eq!(column(&context, "author_username"), ["bob", "bob"]);

    let (_, context) = staff_page(&app, &alice, "/admin/comments?q=WORMS").await;
    assert_eq!(column(&context, "text"), ["Worms help"]);
    assert_eq!(context["query"], "WORMS");
}

#[actix_web::test]
#[serial]
async fn user_listing_shows_profiles_and_filters_flags() {
    let ctx = TestContext::start().await;
    let app = init_app!(ctx);
    let carol = signed_in(&app, "carol").await;
    register(&app, "alice", STRONG_PASSWORD).await;
    register(&app, "bob", STRONG_PASSWORD).await;
    grant_staff(&ctx.pool, "carol").await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE username = 'bob'")
        .execute(&ctx.pool)
        .await
        .expect("deactivate");

    let (template, context) = staff_page(&app, &carol, "/admin/users").await;
    assert_eq!(template, "admin_users");
    assert_eq!(column(&context, "username"), ["alice", "bob", "carol"]);
    let first = &context["page_obj"]["object_list"][0];
    assert_eq!(first["full_name"], "Test User");
    assert_eq!(first["profile"]["contact_number"], "555-0100");
    assert!(first["profile"]["profile_picture_url"].is_null());
    assert!(first.get("password_hash").is_none());

    let (_, context) = staff_page(&app, &carol, "/admin/users?is_staff=1").await;
    assert_eq!(column(&context, "username"), ["carol"]);
    assert_eq!(context["filters"]["is_staff"], true);

    let (_, context) = staff_page(&app, &carol, "/admin/users?is_active=0").await;
    assert_eq!(column(&context, "username"), ["bob"]);

    let (_, context) =
        staff_page(&app, &carol, "/admin/users?is_active=true&is_superuser=false&q=ALI").await;
    assert_eq!(column(&context, "username"), ["alice"]);

    // Deactivated staff lose access along with their session
    sqlx::query("UPDATE users SET is_active = FALSE WHERE username = 'carol'")
        .execute(&ctx.pool)
        .await
        .expect("deactivate");
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/admin/users")
            .cookie(carol)
            .to_request(),
    )
    .await;
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}
