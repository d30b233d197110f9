use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            CreateEmployeeRequest, EmployeeCreatedResponse, LoginRequest, LoginResponse,
            RegisterRequest, RegisterResponse,
        },
        books::{BookList, CreateBookRequest, UpdateBookRequest},
        customers::{CustomerList, CustomerWithAccount, UpdateCustomerRequest},
        mfr_orders::{
            CreateMfrOrderRequest, MfrOrderItemRequest, MfrOrderItemWithBook, MfrOrderList,
            MfrOrderWithItems, UpdateMfrOrderStatusRequest,
        },
        reports::{
            DailySalesRow, SalesSummary, StatusBreakdown, TopBookRow, TopGenreRow, TypeBreakdown,
        },
        sales::{
            BookSummary, OrderItemRequest, OrderItemWithBook, OrderWithDetails, PartyRef,
            PlaceOrderRequest, SaleList, UpdateSaleStatusRequest,
        },
        users::{ProfileResponse, UpdateProfileRequest},
    },
    models::{
        Address, Book, Customer, Employee, MfrOrder, OrderItem, OrderStatus, PaymentMethod,
        Profile, Sale, SaleType, User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, books, health, mfr_orders, params, reports, sales},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::profile,
        auth::update_profile,
        auth::create_employee,
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        sales::place_order,
        sales::list_sales,
        sales::get_sale,
        sales::update_sale_status,
        sales::delete_sale,
        reports::daily_sales,
        reports::top_genres,
        reports::top_books,
        reports::sales_summary,
        mfr_orders::list_mfr_orders,
        mfr_orders::create_mfr_order,
        mfr_orders::get_mfr_order,
        mfr_orders::update_mfr_order_status,
        admin::list_customers,
        admin::update_customer,
        admin::delete_customer,
        admin::delete_user,
        admin::list_low_stock
    ),
    components(
        schemas(
            Address,
            Book,
            Customer,
            Employee,
            User,
            Profile,
            Sale,
            OrderItem,
            MfrOrder,
            SaleType,
            OrderStatus,
            PaymentMethod,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            CreateEmployeeRequest,
            EmployeeCreatedResponse,
            ProfileResponse,
            UpdateProfileRequest,
            BookList,
            CreateBookRequest,
            UpdateBookRequest,
            PlaceOrderRequest,
            OrderItemRequest,
            OrderItemWithBook,
            OrderWithDetails,
            BookSummary,
            PartyRef,
            SaleList,
            UpdateSaleStatusRequest,
            DailySalesRow,
            TopGenreRow,
            TopBookRow,
            TypeBreakdown,
            StatusBreakdown,
            SalesSummary,
            CreateMfrOrderRequest,
            MfrOrderItemRequest,
            MfrOrderItemWithBook,
            MfrOrderList,
            MfrOrderWithItems,
            UpdateMfrOrderStatusRequest,
            CustomerList,
            CustomerWithAccount,
            UpdateCustomerRequest,
            params::Pagination,
            params::BookListQuery,
            params::SaleListQuery,
            params::MfrOrderListQuery,
            params::LowStockQuery,
            params::ReportQuery,
            Meta,
            ApiResponse<Book>,
            ApiResponse<BookList>,
            ApiResponse<OrderWithDetails>,
            ApiResponse<SaleList>,
            ApiResponse<SalesSummary>,
            ApiResponse<MfrOrderList>,
            ApiResponse<CustomerList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Accounts and profiles"),
        (name = "Books", description = "Catalog management"),
        (name = "Sales", description = "Order placement and sales records"),
        (name = "Reports", description = "Sales reporting"),
        (name = "Manufacturer Orders", description = "Restocking orders"),
        (name = "Admin", description = "Administrative endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
