use crate::api::absence::{AbsenceListResponse, CreateAbsence, PendingFilter};
use crate::api::attendance::{AttendanceInput, AttendanceReportQuery, AttendanceReportResponse};
use crate::api::device::{DeviceListQuery, DeviceVerification, RegisterDevice, VerifyDeviceQuery};
use crate::api::office::OfficeInput;
use crate::api::schedule::{EffectiveScheduleQuery, OverrideInput, WeeklyScheduleInput};
use crate::model::absence_request::{AbsenceRequest, AbsenceStatus, AbsenceType};
use crate::model::attendance::{AttendanceKind, AttendanceRecord};
use crate::model::device::DeviceFingerprint;
use crate::model::office_location::OfficeLocation;
use crate::schedule::{AttendanceStatus, ScheduleOverride, WeeklyEntry, WeeklyTemplate};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "1.0.0",
        description = r#"
## Employee attendance

Check-in/out with geolocation and selfie, work schedules, office geofences,
device fingerprints and absence requests.

### Schedules
The schedule for an employee on a date comes from the first tier that has one:
1. a per-date **override**
2. the **weekly** template entry for that weekday
3. the **default**: Monday-Friday 09:00-17:00, weekends off

A check-in is **late** when it happens more than the grace period (15 minutes
by default) after the scheduled start. Day offs are never late.

### Security
Every `/api` endpoint needs a **JWT Bearer** access token. Admin-only
operations are marked in their descriptions.
"#,
    ),
    paths(
        crate::api::schedule::effective_schedule,
        crate::api::schedule::get_weekly_schedule,
        crate::api::schedule::list_weekly_schedules,
        crate::api::schedule::update_weekly_schedule,
        crate::api::schedule::set_schedule_override,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today_attendance,
        crate::api::attendance::attendance_report,

        crate::api::office::list_offices,
        crate::api::office::create_office,
        crate::api::office::update_office,
        crate::api::office::delete_office,

        crate::api::device::register_device,
        crate::api::device::verify_device,
        crate::api::device::list_devices,
        crate::api::device::approve_device,

        crate::api::absence::create_absence,
        crate::api::absence::my_absences,
        crate::api::absence::pending_absences,
        crate::api::absence::approve_absence,
        crate::api::absence::reject_absence
    ),
    components(
        schemas(
            EffectiveScheduleQuery,
            WeeklyScheduleInput,
            OverrideInput,
            WeeklyEntry,
            WeeklyTemplate,
            ScheduleOverride,
            AttendanceStatus,
            AttendanceKind,
            AttendanceInput,
            AttendanceRecord,
            AttendanceReportQuery,
            AttendanceReportResponse,
            OfficeLocation,
            OfficeInput,
            DeviceFingerprint,
            RegisterDevice,
            VerifyDeviceQuery,
            DeviceListQuery,
            DeviceVerification,
            AbsenceRequest,
            AbsenceType,
            AbsenceStatus,
            CreateAbsence,
            PendingFilter,
            AbsenceListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Schedule", description = "Work schedule APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Office", description = "Office geofence APIs"),
        (name = "Device", description = "Device fingerprint APIs"),
        (name = "Absence", description = "Absence request APIs"),
    )
)]
pub struct ApiDoc;

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
