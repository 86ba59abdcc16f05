use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use directory_tests::app_state;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::build_router;
use tower::ServiceExt;

async fn router() -> Result<Router> {
    Ok(build_router(app_state().await?))
}

async fn send(router: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart_request(field: &str, file_name: &str, contents: &str) -> Request<Body> {
    let boundary = "employee-upload-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {contents}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri("/employees/bulk")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn seed_department(router: &Router, name: &str) -> Result<i64> {
    let (status, body) = send(
        router,
        json_request(Method::POST, "/departments", json!({ "name": name })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(body["data"]["id"].as_i64().unwrap())
}

async fn seed_employee(router: &Router, name: &str, department_id: i64) -> Result<i64> {
    let (status, body) = send(
        router,
        json_request(
            Method::POST,
            "/employees",
            json!({
                "name": name,
                "position": "Engineer",
                "departmentId": department_id,
                "hireDate": "2020-04-01"
            }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Ok(body["data"]["id"].as_i64().unwrap())
}

#[tokio::test]
async fn health_reports_database_status() -> Result<()> {
    let router = router().await?;
    let (status, body) = send(&router, get("/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["dbOk"], true);
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn department_creation_wraps_the_record() -> Result<()> {
    let router = router().await?;

    let (status, body) = send(&router, json_request(Method::POST, "/departments", json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Department name is required");

    let (status, body) = send(
        &router,
        json_request(Method::POST, "/departments", json!({ "name": "Engineering" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["name"], "Engineering");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() -> Result<()> {
    let router = router().await?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/projects")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    Ok(())
}

#[tokio::test]
async fn employee_with_unknown_department_is_not_found() -> Result<()> {
    let router = router().await?;
    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/employees",
            json!({
                "name": "Ada",
                "position": "Engineer",
                "departmentId": 404,
                "hireDate": "2020-04-01"
            }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Department not found");

    let (_, body) = send(&router, get("/employees")).await?;
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_rejected() -> Result<()> {
    let router = router().await?;
    let (status, body) = send(
        &router,
        json_request(Method::POST, "/employees", json!({ "name": "Ada" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");
    Ok(())
}

#[tokio::test]
async fn salary_delete_and_list_flow() -> Result<()> {
    let router = router().await?;
    let dept = seed_department(&router, "Engineering").await?;
    let id = seed_employee(&router, "Ada", dept).await?;

    let (status, body) = send(
        &router,
        json_request(
            Method::PUT,
            &format!("/employees/{id}/salary"),
            json!({ "salary": -1 }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid salary value");

    let (status, body) = send(
        &router,
        json_request(
            Method::PUT,
            &format!("/employees/{id}/salary"),
            json!({ "salary": 91000.5 }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["salary"], 91000.5);
    assert_eq!(body["data"]["department"]["name"], "Engineering");

    let (_, body) = send(&router, get("/employees?page=1&limit=10")).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/employees/{id}"))
        .body(Body::empty())?;
    let (status, body) = send(&router, delete).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);

    let (_, body) = send(&router, get("/employees?page=abc&limit=")).await?;
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn unknown_or_malformed_ids_are_not_found() -> Result<()> {
    let router = router().await?;
    let (status, body) = send(&router, get("/employees/abc")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");

    let (status, body) = send(&router, get("/employees/12/tenure")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Employee not found");
    Ok(())
}

#[tokio::test]
async fn project_assignment_conflicts_on_repeat() -> Result<()> {
    let router = router().await?;
    let dept = seed_department(&router, "R&D").await?;
    let id = seed_employee(&router, "Grace", dept).await?;
    let (status, body) = send(
        &router,
        json_request(Method::POST, "/projects", json!({ "name": "Apollo" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = body["data"]["id"].as_i64().unwrap();

    let uri = format!("/employees/{id}/projects");
    let (status, body) = send(&router, json_request(Method::POST, &uri, json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Project ID is required");

    let (status, body) = send(
        &router,
        json_request(Method::POST, &uri, json!({ "projectId": project_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["projects"][0]["name"], "Apollo");

    let (status, body) = send(
        &router,
        json_request(Method::POST, &uri, json!({ "projectId": project_id.to_string() })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Employee is already assigned to this project");

    let (_, body) = send(&router, get(&format!("/employees/{id}"))).await?;
    assert_eq!(body["projects"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn transfer_requires_a_known_department() -> Result<()> {
    let router = router().await?;
    let dept = seed_department(&router, "Old").await?;
    let id = seed_employee(&router, "Linus", dept).await?;
    let uri = format!("/employees/{id}/transfer");

    let (status, body) = send(&router, json_request(Method::PUT, &uri, json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Department ID is required");

    let (status, _) = send(
        &router,
        json_request(Method::PUT, &uri, json!({ "departmentId": 999 })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&router, get(&format!("/employees/{id}"))).await?;
    assert_eq!(body["department"]["id"], dept);
    Ok(())
}

#[tokio::test]
async fn search_requires_a_name() -> Result<()> {
    let router = router().await?;
    let dept = seed_department(&router, "Sales").await?;
    seed_employee(&router, "Margaret Hamilton", dept).await?;

    let (status, body) = send(&router, get("/employees/search")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name parameter is required");

    let (status, body) = send(&router, get("/employees/search?name=Hamil")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Margaret Hamilton");
    Ok(())
}

#[tokio::test]
async fn tenure_and_activity_endpoints() -> Result<()> {
    let router = router().await?;
    let dept = seed_department(&router, "Support").await?;
    let id = seed_employee(&router, "Ken", dept).await?;

    let (status, body) = send(&router, get(&format!("/employees/{id}/tenure"))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["years"].as_i64().unwrap() >= 5);
    assert_eq!(body["hireDate"], "2020-04-01");

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/employees/{id}/activity"))
        .body(Body::empty())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["lastActivityDate"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/employees/deactivate-inactive")
        .body(Body::empty())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deactivatedCount"], 0);
    Ok(())
}

#[tokio::test]
async fn bulk_upload_imports_csv_rows() -> Result<()> {
    let router = router().await?;
    let dept = seed_department(&router, "Imports").await?;
    let csv = format!(
        "name,position,departmentId,hireDate\n\
         Ada, Engineer ,{dept},2021-01-04\n\
         Grace,Admiral,{dept},2019-07-15"
    );

    let (status, body) = send(&router, multipart_request("file", "staff.csv", &csv)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Successfully imported 2 employees");
    assert_eq!(body["data"][0]["position"], "Engineer");
    Ok(())
}

#[tokio::test]
async fn bulk_upload_rejects_bad_files() -> Result<()> {
    let router = router().await?;

    let (status, body) = send(&router, multipart_request("file", "staff.txt", "a,b")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only CSV files are allowed");

    let (status, body) = send(&router, multipart_request("other", "staff.csv", "a,b")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/employees/bulk")
        .body(Body::empty())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");
    Ok(())
}

#[tokio::test]
async fn oversized_page_returns_an_empty_list() -> Result<()> {
    let router = router().await?;
    let dept = seed_department(&router, "Ops").await?;
    seed_employee(&router, "Ada", dept).await?;

    let (status, body) = send(
        &router,
        get("/employees?page=10000000000000000000&limit=10"),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(&router, get(&format!("/employees?page={}&limit=100", u64::MAX))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}
