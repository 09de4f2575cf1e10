//! Diesel schema for task review persistence.

diesel::table! {
    /// Review tasks.
    tasks (id) {
        /// Task identifier.
        id -> Int8,
        /// Central order reference.
        #[max_length = 255]
        order_ref -> Varchar,
        /// City code of the ordering lab.
        #[max_length = 50]
        city_code -> Varchar,
        /// Derived review status.
        #[max_length = 50]
        status -> Varchar,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Creating user.
        created_by -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last updating user.
        updated_by -> Int8,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Ordered tests of a task.
    test_details (id) {
        /// Test detail identifier.
        id -> Int8,
        /// Owning task.
        task_id -> Int8,
        /// Test status.
        #[max_length = 50]
        status -> Varchar,
        /// Ordering lab.
        lab_id -> Int8,
        /// Processing lab.
        processing_lab_id -> Int8,
        /// Central order-system test id.
        #[max_length = 255]
        external_test_id -> Varchar,
        /// LIS test code.
        #[max_length = 255]
        lis_code -> Varchar,
        /// Approval source.
        #[max_length = 50]
        approval_source -> Nullable<Varchar>,
        /// Creating user.
        created_by -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last updating user.
        updated_by -> Int8,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Measured parameters of a test.
    investigation_results (id) {
        /// Investigation identifier.
        id -> Int8,
        /// Owning test detail.
        test_detail_id -> Int8,
        /// Catalogue identifier.
        master_investigation_id -> Int8,
        /// Display name.
        name -> Text,
        /// Reported value.
        value -> Text,
        /// Analyser value.
        device_value -> Text,
        /// Value representation.
        #[max_length = 50]
        result_representation_type -> Varchar,
        /// LIS parameter code.
        #[max_length = 255]
        lis_code -> Varchar,
        /// Abnormality classification.
        #[max_length = 50]
        abnormality -> Varchar,
        /// Whether the value is abnormal.
        is_abnormal -> Bool,
        /// Review status.
        #[max_length = 50]
        status -> Varchar,
        /// Approving user.
        approved_by -> Nullable<Int8>,
        /// Approval timestamp.
        approved_at -> Nullable<Timestamptz>,
        /// Entering user.
        entered_by -> Nullable<Int8>,
        /// Entry timestamp.
        entered_at -> Nullable<Timestamptz>,
        /// Creating user.
        created_by -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last updating user.
        updated_by -> Int8,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Free-form payloads keyed by investigation.
    investigation_data (investigation_id) {
        /// Owning investigation.
        investigation_id -> Int8,
        /// Payload text.
        data -> Text,
        /// Payload type.
        #[max_length = 50]
        data_type -> Varchar,
        /// Creating user.
        created_by -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last updating user.
        updated_by -> Int8,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Remarks attached to investigations.
    remarks (id) {
        /// Remark identifier.
        id -> Int8,
        /// Owning investigation.
        investigation_id -> Int8,
        /// Remark text.
        description -> Text,
        /// Remark kind.
        #[max_length = 50]
        remark_type -> Varchar,
        /// Author.
        remark_by -> Int8,
        /// Creating user.
        created_by -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last updating user.
        updated_by -> Int8,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Deleting user.
        deleted_by -> Nullable<Int8>,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only snapshots of investigations sent back for rerun.
    rerun_investigation_results (id) {
        /// Snapshot identifier.
        id -> Int8,
        /// Test detail of the investigation.
        test_detail_id -> Int8,
        /// Rerun investigation.
        investigation_id -> Int8,
        /// Catalogue identifier.
        master_investigation_id -> Int8,
        /// Display name.
        name -> Text,
        /// Value before the rerun.
        value -> Text,
        /// Analyser value before the rerun.
        device_value -> Text,
        /// Value representation.
        #[max_length = 50]
        result_representation_type -> Varchar,
        /// LIS parameter code.
        #[max_length = 255]
        lis_code -> Varchar,
        /// Requesting user.
        triggered_by -> Int8,
        /// Request timestamp.
        triggered_at -> Timestamptz,
        /// Rerun reason.
        reason -> Text,
        /// Rerun remarks.
        remarks -> Text,
        /// User that entered the prior value.
        entered_by -> Nullable<Int8>,
        /// Entry timestamp of the prior value.
        entered_at -> Nullable<Timestamptz>,
        /// Creating user.
        created_by -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last updating user.
        updated_by -> Int8,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Co-authorization routing of tasks.
    co_authorized_pathologists (id) {
        /// Row identifier.
        id -> Int8,
        /// Routed task.
        task_id -> Int8,
        /// Requesting pathologist.
        co_authorized_by -> Int8,
        /// Target pathologist.
        co_authorized_to -> Int8,
        /// Routing timestamp.
        co_authorized_at -> Timestamptz,
        /// Creating user.
        created_by -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last updating user.
        updated_by -> Int8,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Deleting user.
        deleted_by -> Nullable<Int8>,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Internal users.
    users (id) {
        /// User identifier.
        id -> Int8,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Role category.
        #[max_length = 50]
        user_type -> Varchar,
        /// LIS operator id.
        #[max_length = 50]
        lis_user_id -> Nullable<Varchar>,
        /// Central identity id.
        #[max_length = 255]
        system_user_id -> Nullable<Varchar>,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Pathologist assignments of tasks.
    task_pathologist_mapping (id) {
        /// Row identifier.
        id -> Int8,
        /// Assigned task.
        task_id -> Int8,
        /// Assigned pathologist.
        pathologist_id -> Int8,
        /// Whether the assignment is current.
        is_active -> Bool,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Collected samples and the LIS visits holding them.
    samples (id) {
        /// Sample identifier.
        id -> Int8,
        /// LIS visit number.
        #[max_length = 255]
        visit_id -> Varchar,
        /// Lab holding the visit.
        lab_id -> Int8,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Mapping of ordered tests to their samples.
    test_sample_mapping (id) {
        /// Row identifier.
        id -> Int8,
        /// Central order-system test id.
        #[max_length = 255]
        external_test_id -> Varchar,
        /// Sample carrying the test.
        sample_id -> Int8,
        /// Whether the sample was rejected for this test.
        is_rejected -> Bool,
        /// Soft-delete timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(test_sample_mapping -> samples (sample_id));

diesel::allow_tables_to_appear_in_same_query!(samples, test_sample_mapping);
