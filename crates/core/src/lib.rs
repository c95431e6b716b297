pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod region;
    pub mod video_metadata;
}

pub mod detection {
    pub mod domain {
        pub mod embedding;
        pub mod face_detector;
        pub mod face_embedder;
    }
    pub mod infrastructure;
}

pub mod recognition {
    pub mod domain {
        pub mod face_matcher;
        pub mod reference_store;
    }
}

pub mod attendance {
    pub mod domain {
        pub mod attendance_ledger;
        pub mod attendance_record;
        pub mod clock;
    }
    pub mod infrastructure {
        pub mod csv_format;
        pub mod csv_ledger;
        pub mod system_clock;
    }
}

pub mod video {
    pub mod domain {
        pub mod frame_display;
        pub mod frame_source;
        pub mod image_reader;
    }
    pub mod infrastructure {
        pub mod ffmpeg_frame_source;
        pub mod ffmpeg_image_reader;
        pub mod highgui_display;
    }
}

pub mod pipeline {
    pub mod capture_attendance_use_case;
    pub mod load_references_use_case;
    pub mod pipeline_logger;
}
